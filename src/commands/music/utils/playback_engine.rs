//! The audio-playing primitive shared by every guild session, and its songbird implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use songbird::error::ControlError;
use songbird::input::YoutubeDl;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Event, Songbird, TrackEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event_handlers::SongEndNotifier;
use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::Track;

/// Transport state reported by the engine for a guild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// One engine playback. `epoch` and `play_id` come back in the matching [`TrackEnded`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    /// Epoch of the session that started the playback
    pub epoch: u64,
    pub play_id: u64,
    pub track: Track,
    pub volume: u8,
}

/// Completion notification: the playback started with `play_id` by session `epoch`
/// finished, was stopped, or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEnded {
    pub guild_id: GuildId,
    pub epoch: u64,
    pub play_id: u64,
}

/// Voice connection and playback transport for all guilds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()>;

    async fn leave(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Start `request.track`, replacing whatever the guild is playing.
    async fn play(&self, request: PlayRequest) -> MusicResult<()>;

    /// End the current playback. Its completion notification still fires.
    async fn stop(&self, guild_id: GuildId) -> MusicResult<()>;

    async fn pause(&self, guild_id: GuildId) -> MusicResult<()>;

    async fn unpause(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Volume in percent, 0 to 100.
    async fn set_volume(&self, guild_id: GuildId, percent: u8) -> MusicResult<()>;

    async fn playback_position(&self, guild_id: GuildId) -> Option<Duration>;

    async fn player_status(&self, guild_id: GuildId) -> PlayerStatus;
}

/// Convert a volume percentage into the gain songbird expects
pub fn volume_to_gain(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

fn control_error(action: &str, e: ControlError) -> MusicError {
    MusicError::Engine(format!("Failed to {}: {}", action, e))
}

/// [`PlaybackEngine`] backed by songbird calls and `yt-dlp` inputs
pub struct SongbirdEngine {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    tracks: DashMap<GuildId, TrackHandle>,
    ended: mpsc::UnboundedSender<TrackEnded>,
}

impl SongbirdEngine {
    pub fn new(
        songbird: Arc<Songbird>,
        http: reqwest::Client,
        ended: mpsc::UnboundedSender<TrackEnded>,
    ) -> Self {
        Self {
            songbird,
            http,
            tracks: DashMap::new(),
            ended,
        }
    }

    fn current_handle(&self, guild_id: GuildId) -> MusicResult<TrackHandle> {
        self.tracks
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .ok_or(MusicError::NothingPlaying)
    }

    fn notifier(&self, request: &PlayRequest) -> SongEndNotifier {
        SongEndNotifier {
            guild_id: request.guild_id,
            epoch: request.epoch,
            play_id: request.play_id,
            ended: self.ended.clone(),
        }
    }
}

#[async_trait]
impl PlaybackEngine for SongbirdEngine {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        info!("Joining voice channel {} in guild {}", channel_id, guild_id);
        self.songbird
            .join(guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|e| MusicError::JoinError(e.to_string()))
    }

    async fn leave(&self, guild_id: GuildId) -> MusicResult<()> {
        if let Some((_, handle)) = self.tracks.remove(&guild_id) {
            let _ = handle.stop();
        }

        if self.songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        info!("Leaving voice in guild {}", guild_id);
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| MusicError::Engine(format!("Failed to leave voice channel: {}", e)))
    }

    async fn play(&self, request: PlayRequest) -> MusicResult<()> {
        let call = self
            .songbird
            .get(request.guild_id)
            .ok_or(MusicError::NotConnected)?;

        let input = YoutubeDl::new(self.http.clone(), request.track.url.clone());
        let handle = {
            let mut call = call.lock().await;
            call.play_input(input.into())
        };
        debug!(
            "Started play {} ({}) in guild {}",
            request.play_id, request.track.title, request.guild_id
        );

        handle
            .set_volume(volume_to_gain(request.volume))
            .map_err(|e| control_error("set volume", e))?;

        if let Some(position) = request.track.start_position() {
            // The seek resolves once the input is ready; the returned callback is not awaited.
            let _ = handle.seek(position);
        }

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    self.notifier(&request),
                )
                .map_err(|e| control_error("attach track events", e))?;
        }

        if let Some(previous) = self.tracks.insert(request.guild_id, handle) {
            let _ = previous.stop();
        }

        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        let Ok(handle) = self.current_handle(guild_id) else {
            return Ok(());
        };

        match handle.stop() {
            Ok(()) | Err(ControlError::Finished) => Ok(()),
            Err(e) => Err(control_error("stop track", e)),
        }
    }

    async fn pause(&self, guild_id: GuildId) -> MusicResult<()> {
        self.current_handle(guild_id)?
            .pause()
            .map_err(|e| control_error("pause", e))
    }

    async fn unpause(&self, guild_id: GuildId) -> MusicResult<()> {
        self.current_handle(guild_id)?
            .play()
            .map_err(|e| control_error("resume", e))
    }

    async fn set_volume(&self, guild_id: GuildId, percent: u8) -> MusicResult<()> {
        match self.current_handle(guild_id) {
            Ok(handle) => handle
                .set_volume(volume_to_gain(percent))
                .map_err(|e| control_error("set volume", e)),
            // Applied to the next track through its PlayRequest.
            Err(_) => Ok(()),
        }
    }

    async fn playback_position(&self, guild_id: GuildId) -> Option<Duration> {
        let handle = self.current_handle(guild_id).ok()?;
        match handle.get_info().await {
            Ok(state) => Some(state.position),
            Err(e) => {
                debug!("No playback position for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    async fn player_status(&self, guild_id: GuildId) -> PlayerStatus {
        let Ok(handle) = self.current_handle(guild_id) else {
            return PlayerStatus::Idle;
        };

        match handle.get_info().await {
            Ok(state) => match state.playing {
                PlayMode::Play => PlayerStatus::Playing,
                PlayMode::Pause => PlayerStatus::Paused,
                _ => PlayerStatus::Idle,
            },
            Err(e) => {
                warn!("Failed to query player state for guild {}: {}", guild_id, e);
                PlayerStatus::Idle
            }
        }
    }
}
