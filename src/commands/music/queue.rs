use poise::CreateReply;

use super::process_join;
use super::utils::embedded_messages::music_queue;
use crate::{CommandResult, Context};

/// View queue
#[poise::command(slash_command, category = "Music")]
pub async fn queue(
    ctx: Context<'_>,
    #[description = "Page of the queue to show"]
    #[min = 1]
    page: Option<u32>,
) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let snapshot = handle.lock().await.snapshot().await;
    let page = page.unwrap_or(1) as usize;

    ctx.send(CreateReply::default().embed(music_queue(
        &snapshot,
        page,
        ctx.data().config.primary_color,
    )))
    .await?;
    Ok(())
}
