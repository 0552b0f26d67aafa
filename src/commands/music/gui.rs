use super::utils::control_updates::spawn_control_updates;
use super::{process_join, send_text};
use crate::{CommandResult, Context};

/// Show GUI controls
#[poise::command(slash_command, category = "Music", rename = "gui-show")]
pub async fn gui_show(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };
    let data = ctx.data();

    {
        let mut session = handle.lock().await;
        session.bind_channel(ctx.channel_id());
        session.start_control_updates(spawn_control_updates(
            ctx.serenity_context().http.clone(),
            data.registry.clone(),
            handle.guild_id(),
            handle.epoch(),
            data.config.control_refresh_interval,
            data.config.primary_color,
        ));
    }

    send_text(ctx, "Enable GUI mode!").await
}

/// Hide GUI controls
#[poise::command(slash_command, category = "Music", rename = "gui-hide")]
pub async fn gui_hide(ctx: Context<'_>) -> CommandResult {
    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };

    handle.lock().await.stop_control_updates();
    send_text(ctx, "Disabled GUI mode!").await
}
