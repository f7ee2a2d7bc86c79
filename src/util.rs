use regex::Regex;
use std::sync::OnceLock;

/// Discord rejects plain messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

fn mention_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[@#&][^>]+>").expect("valid mention regex"))
}

fn id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\b\d{10,}\b").expect("valid id regex"))
}

fn user_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"@[A-Za-z0-9_]{2,32}").expect("valid user tag regex"))
}

pub fn anonymize_log_message(message: &str) -> String {
    let without_mentions = mention_regex().replace_all(message, "[redacted]");
    let without_ids = id_regex().replace_all(&without_mentions, "[id]");
    user_tag_regex()
        .replace_all(&without_ids, "@redacted")
        .to_string()
}

pub fn log_error(message: impl AsRef<str>) {
    tracing::error!("{}", anonymize_log_message(message.as_ref()));
}

pub fn log_error_with_source(message: &str, err: &impl std::fmt::Display) {
    log_error(format!("{message}: {err}"));
}

pub fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> (&str, usize) {
    if s.len() <= max_bytes {
        return (s, 0);
    }

    let mut end = max_bytes.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    (&s[..end], s.len() - end)
}

/// Maps ASCII letters and digits onto the Unicode "mathematical bold" block.
/// Everything else passes through untouched.
pub fn to_bold(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = match c {
                'A'..='Z' => 0x1D400 + (c as u32 - 'A' as u32),
                'a'..='z' => 0x1D41A + (c as u32 - 'a' as u32),
                '0'..='9' => 0x1D7CE + (c as u32 - '0' as u32),
                _ => return c,
            };
            char::from_u32(code).unwrap_or(c)
        })
        .collect()
}

/// Splits a reply into chunks that each fit into a single Discord message,
/// breaking on line boundaries where possible.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.chars().count() + line.chars().count() > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        let mut rest = line;
        while rest.chars().count() > limit {
            let cut = rest
                .char_indices()
                .nth(limit)
                .map(|(idx, _)| idx)
                .unwrap_or(rest.len());
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        current.push_str(rest);
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii_boundary() {
        let input = "abcdef";
        let (prefix, truncated) = truncate_on_char_boundary(input, 3);
        assert_eq!(prefix, "abc");
        assert_eq!(truncated, 3);
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let input = "aé😊b";
        let (prefix, truncated) = truncate_on_char_boundary(input, 4);
        assert_eq!(prefix, "aé");
        assert_eq!(truncated, input.len() - prefix.len());
    }

    #[test]
    fn anonymizes_mentions_ids_and_tags() {
        let message = "wish for <@123456789012> failed in 987654321098 by @someone";
        assert_eq!(
            anonymize_log_message(message),
            "wish for [redacted] failed in [id] by @redacted"
        );
    }

    #[test]
    fn bold_maps_letters_and_digits_only() {
        assert_eq!(to_bold("Ab1 -!"), "𝐀𝐛𝟏 -!");
        assert_eq!(to_bold("Zz9"), "𝐙𝐳𝟗");
        assert_eq!(to_bold("é"), "é");
    }

    #[test]
    fn split_message_keeps_short_text_whole() {
        assert_eq!(split_message("one\ntwo\n", 2000), vec!["one\ntwo\n".to_string()]);
    }

    #[test]
    fn split_message_breaks_on_lines() {
        let chunks = split_message("aaaa\nbbbb\ncccc\n", 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
    }

    #[test]
    fn split_message_hard_splits_long_lines() {
        let chunks = split_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }
}
