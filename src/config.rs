use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use std::env;
use std::num::NonZeroU64;

pub const DEFAULT_SING_API_BASE: &str = "https://www.x-noobs-apis.42web.io";

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub database_url: String,
    /// Channel that receives the daily wishes. Without it only the
    /// per-command scan runs.
    pub wish_channel_id: Option<u64>,
    pub wish_time: NaiveTime,
    pub command_prefix: String,
    pub sing_api_base: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| anyhow!("Missing DISCORD_TOKEN in .env"))?;
        let database_url =
            get("DATABASE_URL").ok_or_else(|| anyhow!("Missing DATABASE_URL in .env"))?;

        let wish_channel_id = get("WISH_CHANNEL_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<NonZeroU64>()
                    .map(NonZeroU64::get)
                    .with_context(|| format!("WISH_CHANNEL_ID is not a channel id: {raw}"))
            })
            .transpose()?;

        let wish_time = match get("WISH_TIME") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("WISH_TIME must look like HH:MM, got {raw}"))?,
            None => NaiveTime::default(),
        };

        Ok(Self {
            discord_token,
            database_url,
            wish_channel_id,
            wish_time,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            sing_api_base: get("SING_API_BASE")
                .unwrap_or_else(|| DEFAULT_SING_API_BASE.to_string()),
        })
    }
}
