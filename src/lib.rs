//! GlovedBot: general utility commands plus per-guild music playback.

use std::sync::{Arc, LazyLock};

pub mod commands;
pub mod config;
pub mod events;
pub mod utils;

use commands::music::audio_sources::TrackResolver;
use commands::music::utils::music_manager::SessionRegistry;
use config::BotConfig;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared HTTP client used by the Spotify client and songbird inputs.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data, stored and accessible in all command invocations
pub struct Data {
    pub config: Arc<BotConfig>,
    pub registry: Arc<SessionRegistry>,
    pub resolver: Arc<dyn TrackResolver>,
}
