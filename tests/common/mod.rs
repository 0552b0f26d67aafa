//! Common test utilities, fixtures, and mocks

pub mod fixtures;
pub mod mocks;

use glovedbot::commands::music::utils::music_manager::SessionRegistry;
use glovedbot::commands::music::utils::playback_engine::TrackEnded;
use tokio::sync::mpsc;

/// Deliver every completion the engine has emitted so far, the way the track-end pump would
pub async fn drain_track_ends(
    registry: &SessionRegistry,
    ended: &mut mpsc::UnboundedReceiver<TrackEnded>,
) -> usize {
    let mut delivered = 0;
    while let Ok(event) = ended.try_recv() {
        registry.handle_track_end(event).await;
        delivered += 1;
    }
    delivered
}
