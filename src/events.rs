use std::sync::Arc;

use serenity::all::{ComponentInteraction, VoiceState};
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use tracing::{error, info};

use crate::commands::music::utils::button_controls::BUTTON_PREFIX;
use crate::commands::music::utils::component_handlers;
use crate::commands::music::utils::control_updates::remove_control_message;
use crate::commands::music::utils::music_manager::SessionRegistry;
use crate::config::BotConfig;

/// Gateway events the command framework does not handle
pub struct Handler {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<BotConfig>,
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if component.data.custom_id.starts_with(BUTTON_PREFIX) {
                self.music_component_interaction(&ctx, &component).await;
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        let bot_id = ctx.cache.current_user().id;
        if new.user_id != bot_id || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        if let Some(closed) = self.registry.teardown(guild_id).await {
            info!("Disconnected from voice in guild {}, session closed", guild_id);
            remove_control_message(&ctx.http, &closed).await;
        }
    }
}

impl Handler {
    /// Handle component interactions for components with identities starting with "music_"
    async fn music_component_interaction(&self, ctx: &Context, component: &ComponentInteraction) {
        if let Err(e) =
            component_handlers::handle_interaction(ctx, &self.registry, &self.config, component)
                .await
        {
            error!("Error handling component interaction: {}", e);
        }
    }
}
