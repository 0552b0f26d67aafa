use ::serenity::all::{
    ComponentInteraction, CreateInteractionResponse, CreateInteractionResponseMessage, GuildId,
};
use poise::serenity_prelude::Context;
use tracing::{debug, error, info, warn};

use super::button_controls::PlayerButton;
use super::control_updates::{remove_control_message, update_control_message};
use super::embedded_messages;
use super::music_manager::{ClosedSession, MusicError, MusicResult, SessionRegistry};
use super::queue_manager::{RepeatMode, SessionSnapshot};
use crate::Error;
use crate::config::BotConfig;

type ButtonInteractionResult = Result<(), Error>;

/// What a button press should answer with
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonReply {
    /// The action was applied; acknowledge silently
    Done,
    /// Show the queue to the presser
    Queue(SessionSnapshot),
    /// Re-render the control message
    RefreshControls,
    /// The session was closed; take its control message down
    Closed(ClosedSession),
}

/// Apply a button to the guild's existing session. Buttons never create sessions.
pub async fn apply_button(
    registry: &SessionRegistry,
    guild_id: GuildId,
    button: PlayerButton,
) -> MusicResult<ButtonReply> {
    let handle = registry.get(guild_id).ok_or(MusicError::SessionExpired)?;

    if button == PlayerButton::Leave {
        let closed = registry.teardown(guild_id).await.ok_or(MusicError::SessionExpired)?;
        return Ok(ButtonReply::Closed(closed));
    }

    let mut session = handle.lock().await;
    match button {
        PlayerButton::Next => {
            session.skip().await?;
        }
        PlayerButton::TogglePause => {
            session.toggle_pause().await?;
        }
        PlayerButton::Repeat => session.set_repeat_mode(RepeatMode::All),
        PlayerButton::Loop => session.set_repeat_mode(RepeatMode::One),
        PlayerButton::Mix => {
            session.mix();
        }
        PlayerButton::Queue => return Ok(ButtonReply::Queue(session.snapshot().await)),
        PlayerButton::Controls => return Ok(ButtonReply::RefreshControls),
        PlayerButton::Leave => {}
    }

    Ok(ButtonReply::Done)
}

/// Handle a player button interaction
pub async fn handle_interaction(
    ctx: &Context,
    registry: &SessionRegistry,
    config: &BotConfig,
    interaction: &ComponentInteraction,
) -> ButtonInteractionResult {
    let Some(guild_id) = interaction.guild_id else {
        return error_response(ctx, interaction, &MusicError::NotInGuild).await;
    };

    let Some(button) = PlayerButton::from_custom_id(&interaction.data.custom_id) else {
        error!("Unknown button ID: {}", interaction.data.custom_id);
        return error_response(ctx, interaction, &"Unknown button action.").await;
    };
    debug!("Button {:?} pressed in guild {}", button, guild_id);

    match apply_button(registry, guild_id, button).await {
        Ok(ButtonReply::Done) => {
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            refresh_after_change(ctx, registry, config, guild_id).await;
        }
        Ok(ButtonReply::Queue(snapshot)) => {
            let embed = embedded_messages::music_queue(&snapshot, 1, config.primary_color);
            interaction
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .ephemeral(true),
                    ),
                )
                .await?;
        }
        Ok(ButtonReply::RefreshControls) => {
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            if let Some(handle) = registry.get(guild_id) {
                update_control_message(&ctx.http, &handle, config.primary_color, true).await?;
            }
        }
        Ok(ButtonReply::Closed(closed)) => {
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                .await?;
            remove_control_message(&ctx.http, &closed).await;
        }
        Err(e) => {
            info!("Button {:?} rejected in guild {}: {}", button, guild_id, e);
            error_response(ctx, interaction, &e).await?;
        }
    }

    Ok(())
}

/// Re-render the control message right away so the change shows without waiting for the next tick
async fn refresh_after_change(
    ctx: &Context,
    registry: &SessionRegistry,
    config: &BotConfig,
    guild_id: GuildId,
) {
    let Some(handle) = registry.get(guild_id) else {
        return;
    };
    if let Err(e) = update_control_message(&ctx.http, &handle, config.primary_color, false).await {
        warn!("Failed to refresh control message for guild {}: {}", guild_id, e);
    }
}

/// Answer the presser with an ephemeral error
async fn error_response(
    ctx: &Context,
    interaction: &ComponentInteraction,
    err: &(dyn std::fmt::Display + Sync),
) -> ButtonInteractionResult {
    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(format!("> {}", err))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
