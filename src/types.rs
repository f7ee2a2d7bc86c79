use crate::messenger::DiscordMessenger;
use crate::registry::CommandRegistry;
use crate::song_cache::CachedSongClient;
use crate::store::PgBirthdayStore;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    pub store: PgBirthdayStore,
    pub messenger: DiscordMessenger,
    pub songs: CachedSongClient,
    pub registry: CommandRegistry,
    pub command_prefix: String,
}
