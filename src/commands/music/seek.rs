use std::time::Duration;

use poise::CreateReply;

use super::utils::embedded_messages::seeked;
use super::{process_join, send_error};
use crate::{CommandResult, Context};

/// Play current song on specific time
#[poise::command(slash_command, category = "Music")]
pub async fn seek(
    ctx: Context<'_>,
    #[description = "time in seconds"]
    #[min = 0]
    seconds: f64,
) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    let result = handle.lock().await.seek(seconds).await;
    match result {
        Ok(track) => {
            // The offset was validated against the track duration.
            let embed = seeked(
                &track,
                Duration::from_secs_f64(seconds),
                ctx.data().config.primary_color,
            );
            ctx.send(CreateReply::default().embed(embed)).await?;
            Ok(())
        }
        Err(e) => send_error(ctx, e).await,
    }
}
