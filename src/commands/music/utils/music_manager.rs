use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use super::format_duration;
use super::playback_engine::{PlaybackEngine, TrackEnded};
use super::queue_manager::{ControlMessage, EnqueueOutcome, PlaybackSession};
use crate::commands::music::audio_sources::Track;

/// Errors that can occur during music operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MusicError {
    #[error("This command only works inside a server")]
    NotInGuild,

    #[error("It seems like you are not currently in a voice channel")]
    UserNotInVoiceChannel,

    #[error("I am not in your voice channel, therefore I cannot execute your request")]
    WrongVoiceChannel,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Playback failed: {0}")]
    Engine(String),

    #[error("Not playing anything at the moment")]
    NothingPlaying,

    #[error("I am already quiet, amigo!")]
    AlreadyPaused,

    #[error("No no no, I am already doing my best, amigo!")]
    NotPaused,

    #[error("Time should not be greater than {}", format_duration(*max))]
    InvalidSeekOffset { max: Duration },

    #[error("This player session has expired")]
    SessionExpired,

    #[error("{0}")]
    NotFound(String),

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Outcome of checking a member's voice channel against the bot's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAdmission {
    /// The bot is not connected in this guild and should join the member's channel.
    Join(ChannelId),
    /// The bot already sits in the member's channel.
    AlreadyConnected(ChannelId),
}

/// Decide whether a playback command may run, given the member's and the bot's voice channels.
///
/// The bot never moves between channels: a request from another channel is rejected.
pub fn admit(
    member_channel: Option<ChannelId>,
    bot_channel: Option<ChannelId>,
) -> MusicResult<VoiceAdmission> {
    let member_channel = member_channel.ok_or(MusicError::UserNotInVoiceChannel)?;

    match bot_channel {
        None => Ok(VoiceAdmission::Join(member_channel)),
        Some(channel) if channel == member_channel => Ok(VoiceAdmission::AlreadyConnected(channel)),
        Some(_) => Err(MusicError::WrongVoiceChannel),
    }
}

/// Get the voice channel a user is connected to in a guild, from the cache
pub fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: GuildId,
    user_id: UserId,
) -> MusicResult<Option<ChannelId>> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    Ok(guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id))
}

/// Cloneable reference to one guild's playback session.
///
/// The epoch identifies this particular session: a guild that is torn down and
/// joined again gets a new session with a larger epoch.
#[derive(Clone)]
pub struct SessionHandle {
    guild_id: GuildId,
    epoch: u64,
    session: Arc<Mutex<PlaybackSession>>,
}

impl SessionHandle {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Lock the session. Every mutation of a guild's playback state goes through this lock.
    pub async fn lock(&self) -> MutexGuard<'_, PlaybackSession> {
        self.session.lock().await
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("guild_id", &self.guild_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// What is left of a session after [`SessionRegistry::teardown`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    /// The control message that still shows live buttons, if one was posted
    pub control_message: Option<ControlMessage>,
}

/// Owns the per-guild playback sessions and the engine they share
pub struct SessionRegistry {
    engine: Arc<dyn PlaybackEngine>,
    sessions: DashMap<GuildId, SessionHandle>,
    next_epoch: AtomicU64,
    default_volume: u8,
}

impl SessionRegistry {
    pub fn new(engine: Arc<dyn PlaybackEngine>, default_volume: u8) -> Self {
        Self {
            engine,
            sessions: DashMap::new(),
            next_epoch: AtomicU64::new(1),
            default_volume: default_volume.min(100),
        }
    }

    /// Return the guild's session, creating an empty one bound to the shared engine if needed
    pub fn get_or_create(&self, guild_id: GuildId) -> SessionHandle {
        self.get_or_insert(guild_id).0
    }

    /// Like [`get_or_create`](Self::get_or_create), also telling whether the session is new
    fn get_or_insert(&self, guild_id: GuildId) -> (SessionHandle, bool) {
        let mut created = false;
        let handle = self
            .sessions
            .entry(guild_id)
            .or_insert_with(|| {
                created = true;
                let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst);
                info!("Creating playback session {} for guild {}", epoch, guild_id);
                SessionHandle {
                    guild_id,
                    epoch,
                    session: Arc::new(Mutex::new(PlaybackSession::new(
                        guild_id,
                        epoch,
                        self.engine.clone(),
                        self.default_volume,
                    ))),
                }
            })
            .clone();
        (handle, created)
    }

    /// Return the guild's session connected to `voice_channel`, joining it if the session is
    /// not connected yet. `text_channel` receives the control message once joined.
    ///
    /// The check against the session's channel happens under its lock, so concurrent first
    /// commands from two channels cannot both join. A session created here is removed again
    /// when the join fails.
    pub async fn connect(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
    ) -> MusicResult<SessionHandle> {
        let (handle, created) = self.get_or_insert(guild_id);

        let joined = {
            let mut session = handle.lock().await;
            // The session may have been discarded while this request waited for the lock
            self.get_live(guild_id, handle.epoch)?;
            let joined = session.join(voice_channel).await;
            if let Ok(true) = joined {
                session.bind_channel(text_channel);
            }
            joined
        };

        match joined {
            Ok(_) => Ok(handle),
            Err(e) => {
                if created {
                    self.discard(guild_id, handle.epoch);
                }
                Err(e)
            }
        }
    }

    /// Remove the session with `epoch` from the map, leaving a newer session in place
    fn discard(&self, guild_id: GuildId, epoch: u64) -> bool {
        let removed = self
            .sessions
            .remove_if(&guild_id, |_, handle| handle.epoch == epoch)
            .is_some();
        if removed {
            debug!("Discarded playback session {} for guild {}", epoch, guild_id);
        }
        removed
    }

    /// Lookup without creation
    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions.get(&guild_id).map(|entry| entry.value().clone())
    }

    /// Lookup that only succeeds while the session with `epoch` is still the guild's session.
    ///
    /// Used after every awaited call (track resolution, chat API) before touching the queue.
    pub fn get_live(&self, guild_id: GuildId, epoch: u64) -> MusicResult<SessionHandle> {
        match self.get(guild_id) {
            Some(handle) if handle.epoch == epoch => Ok(handle),
            _ => {
                debug!(
                    "Session {} for guild {} is gone, dropping stale request",
                    epoch, guild_id
                );
                Err(MusicError::SessionExpired)
            }
        }
    }

    /// Drop the guild's session from the map. Idempotent.
    pub fn remove(&self, guild_id: GuildId) -> Option<SessionHandle> {
        self.sessions.remove(&guild_id).map(|(_, handle)| handle)
    }

    /// Remove the guild's session and make it leave voice. Returns `None` if there was none.
    pub async fn teardown(&self, guild_id: GuildId) -> Option<ClosedSession> {
        let handle = self.remove(guild_id)?;
        info!(
            "Tearing down playback session {} for guild {}",
            handle.epoch, guild_id
        );
        let control_message = handle.lock().await.exit().await;
        Some(ClosedSession { control_message })
    }

    /// Enqueue tracks that were resolved while the session lock was not held.
    pub async fn enqueue_resolved(
        &self,
        guild_id: GuildId,
        epoch: u64,
        tracks: Vec<Track>,
    ) -> MusicResult<EnqueueOutcome> {
        let handle = self.get_live(guild_id, epoch)?;
        let mut session = handle.lock().await;
        session.enqueue(tracks).await
    }

    /// Route an engine completion notification to the session that started the playback.
    ///
    /// Completions from a session that has since been torn down are dropped.
    pub async fn handle_track_end(&self, event: TrackEnded) {
        let Ok(handle) = self.get_live(event.guild_id, event.epoch) else {
            debug!(
                "Play {} of session {} ended in guild {} after the session was closed",
                event.play_id, event.epoch, event.guild_id
            );
            return;
        };

        let mut session = handle.lock().await;
        if let Err(e) = session.on_track_end(event.play_id).await {
            error!(
                "Failed to start the next track in guild {}: {}",
                event.guild_id, e
            );
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
