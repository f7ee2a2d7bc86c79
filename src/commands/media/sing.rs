use crate::util::log_error_with_source;
use crate::{types::Context, types::Error};
use chrono::Utc;
use poise::CreateReply;
use poise::serenity_prelude::{CreateAttachment, ReactionType};

/// Reacts to the invoking message. Slash commands have no message to react to.
async fn react(ctx: Context<'_>, emoji: char) {
    if let poise::Context::Prefix(prefix_ctx) = ctx {
        if let Err(err) = prefix_ctx
            .msg
            .react(ctx.http(), ReactionType::Unicode(emoji.to_string()))
            .await
        {
            log_error_with_source("Couldn't react to sing request", &err);
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    category = "media",
    description_localized("en-US", "Search for a song and get its audio"),
    user_cooldown = 10
)]
pub async fn sing(
    ctx: Context<'_>,
    #[rest]
    #[description = "Song to search for"]
    query: Option<String>,
) -> Result<(), Error> {
    let query = query.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        ctx.say("Please provide a search query!").await?;
        return Ok(());
    }

    react(ctx, '⏳').await;
    ctx.defer().await?;
    tracing::info!(query, "Searching for song");

    match ctx.data().songs.fetch_short_track(query).await {
        Ok(Some(track)) => {
            react(ctx, '✅').await;
            let file_name = format!(
                "{}_{}.m4a",
                Utc::now().timestamp_millis(),
                ctx.author().id.get()
            );
            ctx.send(
                CreateReply::default()
                    .content(format!(
                        "🎧 Now playing: {}\nDuration: {}",
                        track.title, track.timestamp
                    ))
                    .attachment(CreateAttachment::bytes(track.audio, file_name)),
            )
            .await?;
        }
        Ok(None) => {
            react(ctx, '❌').await;
            ctx.say("No short videos found (under 10 minutes)!").await?;
        }
        Err(err) => {
            log_error_with_source("sing failed", &err);
            react(ctx, '❌').await;
            ctx.say(format!("❌ Error: {err}")).await?;
        }
    }

    Ok(())
}
