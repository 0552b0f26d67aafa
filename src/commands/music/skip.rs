use super::utils::queue_manager::SkipOutcome;
use super::{process_join, send_error, send_text};
use crate::{CommandResult, Context};

/// Skip current song
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let result = handle.lock().await.skip().await;
    match result {
        Ok(SkipOutcome::Skipped(track)) => send_text(ctx, format!("skipped {}", track.title)).await,
        Ok(SkipOutcome::Stopped(track)) => {
            send_text(
                ctx,
                format!("skipped {}, the queue is empty so I stopped playing", track.title),
            )
            .await
        }
        Err(e) => send_error(ctx, e).await,
    }
}
