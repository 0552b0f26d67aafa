//! In-memory stand-ins for the voice engine

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use glovedbot::commands::music::utils::music_manager::{MusicError, MusicResult};
use glovedbot::commands::music::utils::playback_engine::{
    PlayRequest, PlaybackEngine, PlayerStatus, TrackEnded,
};
use poise::serenity_prelude::{ChannelId, GuildId};
use tokio::sync::mpsc;

/// Every call the fake engine received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Join(ChannelId),
    Leave,
    Play(PlayRequest),
    Stop,
    Pause,
    Unpause,
    SetVolume(u8),
}

/// Records calls and emits completions like songbird does: when a playback is
/// stopped, and when a test declares the current track finished.
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    /// Epoch and play id of each guild's current playback
    playing: Mutex<HashMap<GuildId, (u64, u64)>>,
    fail_play: AtomicBool,
    ended: mpsc::UnboundedSender<TrackEnded>,
}

impl FakeEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TrackEnded>) {
        let (ended, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            playing: Mutex::new(HashMap::new()),
            fail_play: AtomicBool::new(false),
            ended,
        });
        (engine, rx)
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests handed to `play`, oldest first
    pub fn plays(&self) -> Vec<PlayRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Play(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn played_titles(&self) -> Vec<String> {
        self.plays().into_iter().map(|request| request.track.title).collect()
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// The current playback of `guild_id` reached its end
    pub fn finish(&self, guild_id: GuildId) {
        if let Some((epoch, play_id)) = self.playing.lock().unwrap().remove(&guild_id) {
            self.ended
                .send(TrackEnded {
                    guild_id,
                    epoch,
                    play_id,
                })
                .unwrap();
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn join(&self, _guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        self.record(EngineCall::Join(channel_id));
        Ok(())
    }

    async fn leave(&self, guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Leave);
        self.playing.lock().unwrap().remove(&guild_id);
        Ok(())
    }

    async fn play(&self, request: PlayRequest) -> MusicResult<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(MusicError::Engine("voice connection lost".to_string()));
        }
        self.playing
            .lock()
            .unwrap()
            .insert(request.guild_id, (request.epoch, request.play_id));
        self.record(EngineCall::Play(request));
        Ok(())
    }

    async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Stop);
        self.finish(guild_id);
        Ok(())
    }

    async fn pause(&self, _guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    async fn unpause(&self, _guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Unpause);
        Ok(())
    }

    async fn set_volume(&self, _guild_id: GuildId, percent: u8) -> MusicResult<()> {
        self.record(EngineCall::SetVolume(percent));
        Ok(())
    }

    async fn playback_position(&self, guild_id: GuildId) -> Option<Duration> {
        self.playing
            .lock()
            .unwrap()
            .contains_key(&guild_id)
            .then(|| Duration::from_secs(42))
    }

    async fn player_status(&self, guild_id: GuildId) -> PlayerStatus {
        if self.playing.lock().unwrap().contains_key(&guild_id) {
            PlayerStatus::Playing
        } else {
            PlayerStatus::Idle
        }
    }
}
