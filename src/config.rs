//! Runtime configuration, read from the process environment (and `.env`).

use std::env;
use std::fmt;
use std::time::Duration;

use humantime_serde::re::humantime;
use poise::serenity_prelude::UserId;
use thiserror::Error;

const DEFAULT_BOT_NAME: &str = "GlovedBot";
const DEFAULT_PRIMARY_COLOR: u32 = 0x2F3136;
const DEFAULT_VOLUME: u8 = 100;
const DEFAULT_ERROR_MESSAGE_LIFETIME: Duration = Duration::from_secs(15);
const DEFAULT_CONTROL_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_PLAYLIST_TRACKS: usize = 200;

/// Errors raised while building a [`BotConfig`].
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Client-credential pair for the Spotify Web API.
#[derive(Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bot-wide settings shared with every command through [`crate::Data`].
#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    /// Display name used in embeds and the activity line.
    pub bot_name: String,
    pub owner_id: Option<UserId>,
    /// Default embed color.
    pub primary_color: u32,
    /// Volume (0-100) a freshly created playback session starts at.
    pub default_volume: u8,
    /// How long user-facing error replies stay before being deleted.
    pub error_message_lifetime: Duration,
    /// Refresh period of the player control message.
    pub control_refresh_interval: Duration,
    /// Upper bound on tracks taken from a single playlist.
    pub max_playlist_tracks: usize,
    pub spotify: Option<SpotifyCredentials>,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("bot_name", &self.bot_name)
            .field("owner_id", &self.owner_id)
            .field("primary_color", &format!("{:#08x}", self.primary_color))
            .field("default_volume", &self.default_volume)
            .field("error_message_lifetime", &self.error_message_lifetime)
            .field("control_refresh_interval", &self.control_refresh_interval)
            .field("max_playlist_tracks", &self.max_playlist_tracks)
            .field("spotify", &self.spotify)
            .finish()
    }
}

impl BotConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let owner_id = get("BOT_OWNER_ID")
            .map(|raw| {
                raw.parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .map(UserId::new)
                    .ok_or_else(|| invalid("BOT_OWNER_ID", format!("'{}' is not a user id", raw)))
            })
            .transpose()?;

        let primary_color = get("PRIMARY_COLOR")
            .map(|raw| parse_color(&raw).ok_or_else(|| invalid("PRIMARY_COLOR", raw)))
            .transpose()?
            .unwrap_or(DEFAULT_PRIMARY_COLOR);

        let default_volume = match get("DEFAULT_VOLUME") {
            Some(raw) => match raw.parse::<u8>() {
                Ok(volume) if volume <= 100 => volume,
                _ => return Err(invalid("DEFAULT_VOLUME", "expected an integer between 0 and 100")),
            },
            None => DEFAULT_VOLUME,
        };

        let error_message_lifetime = get("ERROR_MESSAGE_LIFETIME")
            .map(|raw| parse_duration("ERROR_MESSAGE_LIFETIME", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_ERROR_MESSAGE_LIFETIME);

        let control_refresh_interval = get("CONTROL_REFRESH_INTERVAL")
            .map(|raw| parse_duration("CONTROL_REFRESH_INTERVAL", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_CONTROL_REFRESH_INTERVAL);
        if control_refresh_interval.is_zero() {
            return Err(invalid("CONTROL_REFRESH_INTERVAL", "must be greater than zero"));
        }

        let max_playlist_tracks = match get("MAX_PLAYLIST_TRACKS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(invalid("MAX_PLAYLIST_TRACKS", "expected a positive integer")),
            },
            None => DEFAULT_MAX_PLAYLIST_TRACKS,
        };

        let spotify = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("SPOTIFY_CLIENT_SECRET")),
            (None, Some(_)) => return Err(ConfigError::Missing("SPOTIFY_CLIENT_ID")),
        };

        Ok(Self {
            discord_token,
            bot_name: get("BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            owner_id,
            primary_color,
            default_volume,
            error_message_lifetime,
            control_refresh_interval,
            max_playlist_tracks,
            spotify,
        })
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| invalid(key, e.to_string()))
}

/// Parse `#RRGGBB`, `0xRRGGBB` or plain `RRGGBB`.
fn parse_color(raw: &str) -> Option<u32> {
    let hex = raw
        .strip_prefix('#')
        .or_else(|| raw.strip_prefix("0x"))
        .unwrap_or(raw);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
