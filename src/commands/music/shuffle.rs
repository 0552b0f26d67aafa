use super::{process_join, send_text};
use crate::{CommandResult, Context};

/// Shuffle queue
#[poise::command(slash_command, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    handle.lock().await.mix();
    send_text(ctx, "playlist shuffled!").await
}
