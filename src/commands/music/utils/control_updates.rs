//! The player control message: an embed with buttons, re-rendered periodically while enabled.

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::all::{ChannelId, CreateMessage, EditMessage, GuildId, Http, MessageId};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::button_controls::create_player_buttons;
use super::embedded_messages::player_embed;
use super::music_manager::{ClosedSession, SessionHandle, SessionRegistry};
use super::queue_manager::{ControlMessage, SessionSnapshot};
use crate::Error;

/// Edit the existing control message, or send a new one when there is none or the edit fails
pub async fn send_or_update_message(
    http: &Http,
    channel_id: ChannelId,
    message_id: Option<MessageId>,
    snapshot: &SessionSnapshot,
    color: u32,
) -> Result<MessageId, Error> {
    let embed = player_embed(snapshot, color);
    let components = create_player_buttons(snapshot.status, snapshot.current.is_some());

    if let Some(message_id) = message_id {
        let edit = EditMessage::new()
            .embed(embed.clone())
            .components(components.clone());
        match channel_id.edit_message(http, message_id, edit).await {
            Ok(_) => return Ok(message_id),
            Err(e) => debug!("Failed to update control message {}, sending a new one: {}", message_id, e),
        }
    }

    let message = channel_id
        .send_message(http, CreateMessage::new().embed(embed).components(components))
        .await?;
    Ok(message.id)
}

/// Render the control message once. With `force` it is sent even while controls are disabled.
///
/// Returns false when there is nothing to render (controls disabled or no bound channel).
pub async fn update_control_message(
    http: &Http,
    handle: &SessionHandle,
    color: u32,
    force: bool,
) -> Result<bool, Error> {
    let (snapshot, channel_id, message_id) = {
        let session = handle.lock().await;
        if !force && !session.control_enabled() {
            return Ok(false);
        }
        let Some(channel_id) = session.bound_channel() else {
            return Ok(false);
        };
        (session.snapshot().await, channel_id, session.control_message())
    };

    let sent = send_or_update_message(http, channel_id, message_id, &snapshot, color).await?;
    if Some(sent) != message_id {
        handle.lock().await.set_control_message(Some(sent));
    }
    Ok(true)
}

/// Delete the control message a closed session left behind, so its buttons go away with it
pub async fn remove_control_message(http: &Http, closed: &ClosedSession) {
    let Some(ControlMessage {
        channel_id,
        message_id,
    }) = closed.control_message
    else {
        return;
    };
    match channel_id.delete_message(http, message_id).await {
        Ok(()) => debug!("Removed control message {} in channel {}", message_id, channel_id),
        Err(e) => debug!("Failed to remove control message {}: {}", message_id, e),
    }
}

/// Spawn the refresh loop for one session. It ends on its own once the session is gone
/// or its controls were disabled.
pub fn spawn_control_updates(
    http: Arc<Http>,
    registry: Arc<SessionRegistry>,
    guild_id: GuildId,
    epoch: u64,
    interval: Duration,
    color: u32,
) -> JoinHandle<()> {
    info!("Starting control updates for guild {}", guild_id);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Ok(handle) = registry.get_live(guild_id, epoch) else {
                info!("Session gone, stopping control updates for guild {}", guild_id);
                break;
            };

            match update_control_message(&http, &handle, color, false).await {
                Ok(true) => debug!("Updated control message for guild {}", guild_id),
                Ok(false) => {
                    info!("Control updates disabled for guild {}", guild_id);
                    break;
                }
                Err(e) => warn!(
                    "Error updating control message for guild {}: {}",
                    guild_id, e
                ),
            }
        }
    })
}
