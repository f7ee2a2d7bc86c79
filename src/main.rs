mod commands;
mod config;
mod dates;
mod messenger;
mod registry;
mod scheduler;
mod song_api;
mod song_cache;
mod store;
#[cfg(test)]
mod testing;
mod types;
mod util;

use config::BotConfig;
use messenger::DiscordMessenger;
use poise::{FrameworkError, serenity_prelude as serenity};
use registry::CommandRegistry;
use scheduler::DailyTrigger;
use song_cache::CachedSongClient;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use store::PgBirthdayStore;
use tracing_subscriber::EnvFilter;
use util::*;

#[tokio::main]
async fn main() -> Result<(), types::Error> {
    // A missing .env is fine when the variables come from the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    let database = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .idle_timeout(std::time::Duration::from_secs(600))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    let store = PgBirthdayStore::new(database);
    store.migrate().await?;
    tracing::info!("Birthday store ready");

    let songs = CachedSongClient::new(&config.sing_api_base)?;

    let command_prefix = config.command_prefix.clone();
    let wish_channel_id = config.wish_channel_id;
    let wish_time = config.wish_time;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        FrameworkError::Command { error, ctx, .. } => {
                            log_error_with_source(
                                &format!("Command /{} failed", ctx.command().name),
                                &error,
                            );
                            if let Err(err) = ctx
                                .say("❌ | Something went wrong while running that command.")
                                .await
                            {
                                log_error_with_source(
                                    "Error sending command failure notice",
                                    &err,
                                );
                            }
                        }
                        other => {
                            if let Err(err) = poise::builtins::on_error(other).await {
                                log_error_with_source(
                                    "Error while handling framework error with default handler",
                                    &err,
                                );
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let messenger = DiscordMessenger::new(ctx.http.clone());
                let registry = CommandRegistry::from_commands(&framework.options().commands);

                match wish_channel_id {
                    Some(channel_id) => {
                        scheduler::spawn_daily_wishes(
                            DailyTrigger::new(wish_time),
                            Arc::new(store.clone()),
                            Arc::new(messenger.clone()),
                            channel_id,
                        );
                        tracing::info!(%wish_time, "Daily birthday wishes scheduled");
                    }
                    None => tracing::warn!(
                        "WISH_CHANNEL_ID is not set; birthdays are only wished when a command runs"
                    ),
                }

                Ok(types::Data {
                    store,
                    messenger,
                    songs,
                    registry,
                    command_prefix,
                })
            })
        })
        .build();

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}
