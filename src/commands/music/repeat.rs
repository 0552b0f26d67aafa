use poise::ChoiceParameter;

use super::utils::queue_manager::RepeatMode;
use super::{process_join, send_text};
use crate::{CommandResult, Context};

/// Choose what happens to finished tracks
#[poise::command(slash_command, category = "Music")]
pub async fn repeat(
    ctx: Context<'_>,
    #[description = "Off, repeat the current track, or repeat the whole queue"] mode: RepeatMode,
) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    handle.lock().await.set_repeat_mode(mode);
    send_text(ctx, format!("repeat mode set to {}", mode.name())).await
}
