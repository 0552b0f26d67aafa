use poise::CreateReply;

use super::utils::embedded_messages::current_track;
use super::utils::music_manager::MusicError;
use super::{process_join, send_error};
use crate::{CommandResult, Context};

/// Show details of currently playing song
#[poise::command(slash_command, category = "Music")]
pub async fn current(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let snapshot = handle.lock().await.snapshot().await;
    let Some(track) = snapshot.current else {
        return send_error(ctx, MusicError::NothingPlaying).await;
    };

    let embed = current_track(
        &track,
        snapshot.position.unwrap_or_default(),
        ctx.data().config.primary_color,
    );
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
