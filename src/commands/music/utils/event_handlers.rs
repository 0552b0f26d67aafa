use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::music_manager::SessionRegistry;
use super::playback_engine::TrackEnded;

/// Songbird event handler forwarding the end (or failure) of one playback
pub struct SongEndNotifier {
    pub guild_id: serenity::GuildId,
    pub epoch: u64,
    pub play_id: u64,
    pub ended: mpsc::UnboundedSender<TrackEnded>,
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            debug!("Play {} ended in guild {}", self.play_id, self.guild_id);
            let event = TrackEnded {
                guild_id: self.guild_id,
                epoch: self.epoch,
                play_id: self.play_id,
            };
            if self.ended.send(event).is_err() {
                warn!("Track end channel closed, dropping event for guild {}", self.guild_id);
            }
        }
        None
    }
}

/// Deliver track completions to their sessions, one at a time, until every sender is gone.
///
/// Runs outside songbird's event thread so a session may call back into the engine while handling it.
pub async fn pump_track_end_events(
    registry: Arc<SessionRegistry>,
    mut ended: mpsc::UnboundedReceiver<TrackEnded>,
) {
    while let Some(event) = ended.recv().await {
        registry.handle_track_end(event).await;
    }
    info!("Track end channel closed");
}
