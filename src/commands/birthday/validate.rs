use linkify::{LinkFinder, LinkKind};
use regex::Regex;
use rustrict::{Censor, Type};
use std::sync::OnceLock;

pub const MAX_NAME_CHARS: usize = 64;

fn user_mention_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^<@!?(\d{1,20})>$").expect("valid user mention regex"))
}

/// Checks a birthday name before it is stored.
///
/// A name that is exactly one user mention is allowed and yields that user's
/// id so the wish can ping them.
pub fn validate_name(name: &str) -> Result<Option<i64>, String> {
    let name = name.trim();

    if let Some(captures) = user_mention_regex().captures(name) {
        return match captures[1].parse::<i64>() {
            Ok(id) if id > 0 => Ok(Some(id)),
            _ => Err("That user mention isn't valid.".to_string()),
        };
    }

    if name.chars().count() > MAX_NAME_CHARS {
        return Err(format!("Names must be {MAX_NAME_CHARS} characters or less."));
    }

    let lowered = name.to_lowercase();
    if lowered.contains("@everyone") || lowered.contains("@here") || name.contains("<@") {
        return Err("Names can't contain pings other than a single user mention.".to_string());
    }

    let finder = LinkFinder::new();
    let links: Vec<_> = finder.links(name).collect();
    if links.iter().any(|link| link.kind() == &LinkKind::Url) {
        return Err("Links and URLs are not allowed in names.".to_string());
    }
    if links.iter().any(|link| link.kind() == &LinkKind::Email) {
        return Err("Email addresses are not allowed in names.".to_string());
    }

    let analysis = Censor::from_str(name).analyze();
    let severely_mean = analysis.is(Type::MEAN) && analysis.is(Type::SEVERE);
    let severely_offensive = analysis.is(Type::OFFENSIVE) && analysis.is(Type::SEVERE);
    if severely_mean || severely_offensive {
        return Err("That name contains slurs or other disallowed language.".to_string());
    }

    Ok(None)
}
