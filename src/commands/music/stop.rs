use tracing::info;

use super::utils::control_updates::remove_control_message;
use super::{process_join, send_text};
use crate::{CommandResult, Context};

/// Stop music player
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    if let Some(closed) = ctx.data().registry.teardown(handle.guild_id()).await {
        info!("Player stopped by {} in guild {}", ctx.author().id, handle.guild_id());
        remove_control_message(ctx.http(), &closed).await;
    }

    send_text(ctx, "adios amigo, see you later!").await
}
