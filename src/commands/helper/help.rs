use crate::registry::CommandRegistry;
use crate::util::to_bold;
use crate::{types::Context, types::Error};

const COMMANDS_PER_LINE: usize = 2;
const BOX_FOOTER: &str = "╰──────────⭓\n";

fn bold_heading(text: &str) -> String {
    to_bold(&text.to_uppercase())
}

pub fn render_category_list(registry: &CommandRegistry, prefix: &str) -> String {
    let mut out = String::from("╭──⭓[ 𝐂𝐚𝐭𝐞𝐠𝐨𝐫𝐲 𝐋𝐢𝐬𝐭🎖]\n");
    for category in registry.categories() {
        out.push_str(&format!("│ ✧ {}\n", bold_heading(category)));
    }
    out.push_str(BOX_FOOTER);
    out.push_str(&format!("⭔ Type {prefix}help <category> to see commands."));
    out
}

pub fn render_category(registry: &CommandRegistry, query: &str, prefix: &str) -> String {
    let Some((category, commands)) = registry.find_category(query) else {
        let known: Vec<&str> = registry.categories().collect();
        return format!(
            "❌ Category \"{}\" not found.\n⭔ Try: {}",
            query.trim(),
            known.join(", ")
        );
    };

    let mut out = format!("╭──⭓[ {} ]\n", bold_heading(category));
    for line in commands.chunks(COMMANDS_PER_LINE) {
        let names: Vec<&str> = line.iter().map(|command| command.name.as_str()).collect();
        out.push_str(&format!("│ ✧ {}\n", names.join(" ✧ ")));
    }
    out.push_str(BOX_FOOTER);
    out.push_str(&format!("⭔ Type {prefix}<command> to use it."));
    out
}

#[poise::command(
    prefix_command,
    slash_command,
    category = "info",
    description_localized("en-US", "Show commands by category"),
    user_cooldown = 5
)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Category to list"] category: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let prefix = data.command_prefix.as_str();

    let reply = match category.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => render_category(&data.registry, query, prefix),
        _ => render_category_list(&data.registry, prefix),
    };

    ctx.say(reply).await?;
    Ok(())
}
