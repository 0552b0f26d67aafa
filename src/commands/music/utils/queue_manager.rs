use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::playback_engine::{PlayRequest, PlaybackEngine, PlayerStatus};
use crate::commands::music::audio_sources::Track;

/// What happens to a track once it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, poise::ChoiceParameter)]
pub enum RepeatMode {
    #[default]
    Off,
    /// Replay the finished track
    One,
    /// Send finished tracks to the back of the queue
    All,
}

/// Why the current playback is about to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    Skipped,
    /// A seek requeued the track at the head
    Replaced,
}

/// Result of adding tracks to a session
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    /// The session was idle and the first added track started playing
    Started { track: Track, added: usize },
    /// Tracks were appended behind the current one; `position` is the 1-based queue slot of the first
    Queued { position: usize, added: usize },
}

/// Result of a skip request
#[derive(Debug, Clone, PartialEq)]
pub enum SkipOutcome {
    /// The track was ended and the next one starts on completion
    Skipped(Track),
    /// The last track was ended and nothing follows it
    Stopped(Track),
}

/// Point-in-time copy of a session, used to render replies and the control message
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub guild_id: GuildId,
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    pub status: PlayerStatus,
    pub volume: u8,
    pub repeat: RepeatMode,
    pub position: Option<Duration>,
}

impl SessionSnapshot {
    /// Total length of the pending queue
    pub fn queue_duration(&self) -> Duration {
        self.queue.iter().map(|track| track.duration).sum()
    }
}

/// Where a session's control message was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Per-guild playback state: the queue, the current track and its transport state.
///
/// Sessions are reached through [`SessionHandle::lock`](super::music_manager::SessionHandle::lock),
/// so every method runs with the guild's lock held.
pub struct PlaybackSession {
    guild_id: GuildId,
    epoch: u64,
    engine: Arc<dyn PlaybackEngine>,
    queue: VecDeque<Track>,
    current: Option<Track>,
    status: PlayerStatus,
    volume: u8,
    repeat: RepeatMode,
    next_play_id: u64,
    current_play_id: Option<u64>,
    pending_end: Option<EndReason>,
    voice_channel: Option<ChannelId>,
    bound_channel: Option<ChannelId>,
    control_enabled: bool,
    control_message: Option<MessageId>,
    control_task: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    pub fn new(guild_id: GuildId, epoch: u64, engine: Arc<dyn PlaybackEngine>, volume: u8) -> Self {
        Self {
            guild_id,
            epoch,
            engine,
            queue: VecDeque::new(),
            current: None,
            status: PlayerStatus::Idle,
            volume: volume.min(100),
            repeat: RepeatMode::Off,
            next_play_id: 1,
            current_play_id: None,
            pending_end: None,
            voice_channel: None,
            bound_channel: None,
            control_enabled: false,
            control_message: None,
            control_task: None,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Id of the engine playback backing the current track
    pub fn current_play_id(&self) -> Option<u64> {
        self.current_play_id
    }

    /// Voice channel the session joined
    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.voice_channel
    }

    pub fn bound_channel(&self) -> Option<ChannelId> {
        self.bound_channel
    }

    /// Text channel that receives the control message
    pub fn bind_channel(&mut self, channel_id: ChannelId) {
        self.bound_channel = Some(channel_id);
    }

    /// Connect to `channel_id`. Returns false when the session is already there.
    ///
    /// A session never moves: asking for another channel once connected is rejected.
    pub async fn join(&mut self, channel_id: ChannelId) -> MusicResult<bool> {
        match self.voice_channel {
            Some(current) if current == channel_id => return Ok(false),
            Some(_) => return Err(MusicError::WrongVoiceChannel),
            None => {}
        }

        self.engine.join(self.guild_id, channel_id).await?;
        self.voice_channel = Some(channel_id);
        Ok(true)
    }

    /// Append tracks, starting the first one if nothing is playing.
    ///
    /// If the engine refuses to start it, the added tracks are removed again.
    pub async fn enqueue(&mut self, tracks: Vec<Track>) -> MusicResult<EnqueueOutcome> {
        if tracks.is_empty() {
            return Err(MusicError::NotFound("Nothing to add to the queue".to_string()));
        }

        let previous_len = self.queue.len();
        let added = tracks.len();
        self.queue.extend(tracks);
        info!(
            "Added {} track(s) to the queue of guild {} ({} pending)",
            added,
            self.guild_id,
            self.queue.len()
        );

        if self.current.is_some() {
            return Ok(EnqueueOutcome::Queued {
                position: previous_len + 1,
                added,
            });
        }

        match self.start_next().await {
            Ok(Some(track)) => Ok(EnqueueOutcome::Started { track, added }),
            Ok(None) => Ok(EnqueueOutcome::Queued {
                position: previous_len + 1,
                added,
            }),
            Err(e) => {
                self.queue.truncate(previous_len);
                Err(e)
            }
        }
    }

    /// Advance after the current track finished on its own, honoring the repeat mode.
    pub async fn play_next(&mut self) -> MusicResult<Option<Track>> {
        self.advance(None).await
    }

    /// Engine completion notification. Ends for superseded playbacks are ignored.
    pub async fn on_track_end(&mut self, play_id: u64) -> MusicResult<Option<Track>> {
        if self.current_play_id != Some(play_id) {
            debug!(
                "Ignoring end of stale play {} in guild {} (current: {:?})",
                play_id, self.guild_id, self.current_play_id
            );
            return Ok(None);
        }

        let reason = self.pending_end.take();
        self.advance(reason).await
    }

    async fn advance(&mut self, reason: Option<EndReason>) -> MusicResult<Option<Track>> {
        self.current_play_id = None;
        self.pending_end = None;

        if let Some(mut finished) = self.current.take() {
            finished.seek_offset = None;
            match (self.repeat, reason) {
                (RepeatMode::One, None) => self.queue.push_front(finished),
                (RepeatMode::All, None | Some(EndReason::Skipped)) => {
                    self.queue.push_back(finished)
                }
                _ => {}
            }
        }

        self.start_next().await
    }

    /// Pop the head of the queue and hand it to the engine
    async fn start_next(&mut self) -> MusicResult<Option<Track>> {
        let Some(track) = self.queue.pop_front() else {
            info!("Queue finished in guild {}", self.guild_id);
            self.status = PlayerStatus::Idle;
            return Ok(None);
        };

        let play_id = self.next_play_id;
        self.next_play_id += 1;

        let request = PlayRequest {
            guild_id: self.guild_id,
            epoch: self.epoch,
            play_id,
            track: track.clone(),
            volume: self.volume,
        };

        match self.engine.play(request).await {
            Ok(()) => {
                info!("Now playing '{}' in guild {}", track.title, self.guild_id);
                self.current = Some(track.clone());
                self.current_play_id = Some(play_id);
                self.status = PlayerStatus::Playing;
                Ok(Some(track))
            }
            Err(e) => {
                error!(
                    "Engine refused to play '{}' in guild {}: {}",
                    track.title, self.guild_id, e
                );
                self.queue.push_front(track);
                self.status = PlayerStatus::Idle;
                Err(e)
            }
        }
    }

    /// End the current track. Skipping the last track stops playback right away.
    pub async fn skip(&mut self) -> MusicResult<SkipOutcome> {
        self.end_current(EndReason::Skipped).await
    }

    async fn end_current(&mut self, reason: EndReason) -> MusicResult<SkipOutcome> {
        let Some(current) = self.current.clone() else {
            return Err(MusicError::NothingPlaying);
        };

        let advances = !self.queue.is_empty() || self.repeat == RepeatMode::All;
        self.engine.stop(self.guild_id).await?;

        if advances {
            self.pending_end = Some(reason);
            Ok(SkipOutcome::Skipped(current))
        } else {
            info!("Skipped the last track in guild {}", self.guild_id);
            self.current = None;
            self.current_play_id = None;
            self.pending_end = None;
            self.status = PlayerStatus::Idle;
            Ok(SkipOutcome::Stopped(current))
        }
    }

    /// Restart the current track at `offset_seconds`.
    pub async fn seek(&mut self, offset_seconds: f64) -> MusicResult<Track> {
        let Some(current) = self.current.as_ref() else {
            return Err(MusicError::NothingPlaying);
        };

        if !current.accepts_offset(offset_seconds) {
            return Err(MusicError::InvalidSeekOffset {
                max: current.duration,
            });
        }

        let mut replay = current.clone();
        replay.seek_offset = Some(offset_seconds);
        self.queue.push_front(replay.clone());

        if let Err(e) = self.end_current(EndReason::Replaced).await {
            self.queue.pop_front();
            return Err(e);
        }

        info!(
            "Seeking '{}' to {}s in guild {}",
            replay.title, offset_seconds, self.guild_id
        );
        Ok(replay)
    }

    pub async fn pause(&mut self) -> MusicResult<Track> {
        let current = match (&self.current, self.status) {
            (Some(track), PlayerStatus::Playing) => track.clone(),
            (Some(_), _) => return Err(MusicError::AlreadyPaused),
            (None, _) => return Err(MusicError::NothingPlaying),
        };

        self.engine.pause(self.guild_id).await?;
        self.status = PlayerStatus::Paused;
        Ok(current)
    }

    pub async fn unpause(&mut self) -> MusicResult<Track> {
        let current = match (&self.current, self.status) {
            (Some(track), PlayerStatus::Paused) => track.clone(),
            (Some(_), _) => return Err(MusicError::NotPaused),
            (None, _) => return Err(MusicError::NothingPlaying),
        };

        self.engine.unpause(self.guild_id).await?;
        self.status = PlayerStatus::Playing;
        Ok(current)
    }

    /// Pause when playing, resume when paused. Returns the new status.
    pub async fn toggle_pause(&mut self) -> MusicResult<PlayerStatus> {
        if self.status == PlayerStatus::Paused {
            self.unpause().await?;
        } else {
            self.pause().await?;
        }
        Ok(self.status)
    }

    /// Clamp to 0..=100 and apply. Returns the applied volume.
    pub async fn set_volume(&mut self, volume: i64) -> MusicResult<u8> {
        let clamped = volume.clamp(0, 100) as u8;
        self.engine.set_volume(self.guild_id, clamped).await?;
        self.volume = clamped;
        Ok(clamped)
    }

    /// Shuffle the pending queue. Returns its length.
    pub fn mix(&mut self) -> usize {
        self.queue.make_contiguous().shuffle(&mut rand::rng());
        self.queue.len()
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        debug!("Repeat mode in guild {} set to {:?}", self.guild_id, mode);
        self.repeat = mode;
    }

    /// Stop everything and leave voice. The session is unusable afterwards.
    ///
    /// Returns the last control message so the caller can take it down.
    pub async fn exit(&mut self) -> Option<ControlMessage> {
        self.stop_control_updates();
        let control = self
            .bound_channel
            .zip(self.control_message.take())
            .map(|(channel_id, message_id)| ControlMessage {
                channel_id,
                message_id,
            });
        self.voice_channel = None;
        self.queue.clear();
        self.current = None;
        self.current_play_id = None;
        self.pending_end = None;
        self.status = PlayerStatus::Idle;

        if let Err(e) = self.engine.leave(self.guild_id).await {
            warn!("Failed to leave voice in guild {}: {}", self.guild_id, e);
        }
        control
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let position = match self.current {
            Some(_) => self.engine.playback_position(self.guild_id).await,
            None => None,
        };

        SessionSnapshot {
            guild_id: self.guild_id,
            current: self.current.clone(),
            queue: self.queue.iter().cloned().collect(),
            status: self.status,
            volume: self.volume,
            repeat: self.repeat,
            position,
        }
    }

    pub fn control_enabled(&self) -> bool {
        self.control_enabled
    }

    pub fn control_message(&self) -> Option<MessageId> {
        self.control_message
    }

    pub fn set_control_message(&mut self, message_id: Option<MessageId>) {
        self.control_message = message_id;
    }

    /// Enable the control message, replacing any running refresh task
    pub fn start_control_updates(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.control_task.replace(task) {
            previous.abort();
        }
        self.control_enabled = true;
    }

    pub fn stop_control_updates(&mut self) {
        if let Some(task) = self.control_task.take() {
            task.abort();
        }
        self.control_enabled = false;
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(task) = self.control_task.take() {
            task.abort();
        }
    }
}
