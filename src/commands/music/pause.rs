use super::{process_join, send_error, send_text};
use crate::{CommandResult, Context};

/// Pause current track
#[poise::command(slash_command, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let result = handle.lock().await.pause().await;
    match result {
        Ok(track) => send_text(ctx, format!("paused {}", track.title)).await,
        Err(e) => send_error(ctx, e).await,
    }
}

/// Resume current track
#[poise::command(slash_command, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let result = handle.lock().await.unpause().await;
    match result {
        Ok(track) => send_text(ctx, format!("resuming {}", track.title)).await,
        Err(e) => send_error(ctx, e).await,
    }
}
