use super::{process_join, send_error, send_text};
use crate::{CommandResult, Context};

/// Set volume
#[poise::command(slash_command, category = "Music", rename = "set-volume")]
pub async fn set_volume(
    ctx: Context<'_>,
    #[description = "Set volume"]
    #[min = 0]
    #[max = 100]
    volume: i64,
) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let result = handle.lock().await.set_volume(volume).await;
    match result {
        Ok(applied) => send_text(ctx, format!("volume set to {}", applied)).await,
        Err(e) => send_error(ctx, e).await,
    }
}
