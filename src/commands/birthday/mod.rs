pub mod router;
mod validate;

use crate::types::{Context, Error};
use crate::util::{MESSAGE_LIMIT, split_message};
use chrono::Local;

type CommandVec = Vec<poise::Command<crate::types::Data, Error>>;

pub fn birthday_commands() -> CommandVec {
    vec![birthday()]
}

#[poise::command(
    prefix_command,
    slash_command,
    category = "utility",
    description_localized("en-US", "Add, remove, edit, view and count down birthdays"),
    user_cooldown = 5
)]
pub async fn birthday(
    ctx: Context<'_>,
    #[rest]
    #[description = "Action and arguments, e.g. add 05-06-2001 Alice"]
    args: Option<String>,
) -> Result<(), Error> {
    let raw = args.unwrap_or_default();
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let today = Local::now().date_naive();
    let data = ctx.data();

    let reply = router::run(
        &data.store,
        &data.messenger,
        ctx.channel_id().get(),
        today,
        &tokens,
    )
    .await?;

    for chunk in split_message(&reply, MESSAGE_LIMIT) {
        ctx.say(chunk).await?;
    }

    Ok(())
}
