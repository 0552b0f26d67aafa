//! The `/music` command group.

pub mod audio_sources;
pub mod utils;

pub(crate) mod current;
pub(crate) mod gui;
pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod queue;
pub(crate) mod repeat;
pub(crate) mod seek;
pub(crate) mod shuffle;
pub(crate) mod skip;
pub(crate) mod stop;
pub(crate) mod volume;

use std::fmt::Display;

use tracing::{debug, info};

use crate::utils::transient::send_transient;
use crate::{CommandResult, Context, Error};
use utils::embedded_messages::{error_reply, text_reply};
use utils::music_manager::{
    MusicError, MusicResult, SessionHandle, VoiceAdmission, admit, user_voice_channel,
};

/// Music player commands
#[poise::command(
    slash_command,
    category = "Music",
    guild_only,
    subcommand_required,
    subcommands(
        "play::play",
        "play::playlist",
        "play::spotify",
        "current::current",
        "seek::seek",
        "queue::queue",
        "pause::pause",
        "pause::resume",
        "skip::skip",
        "volume::set_volume",
        "stop::stop",
        "shuffle::shuffle",
        "gui::gui_show",
        "gui::gui_hide",
        "repeat::repeat"
    )
)]
pub async fn music(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

/// Send an error reply that deletes itself after the configured lifetime
pub(crate) async fn send_error(ctx: Context<'_>, err: impl Display) -> CommandResult {
    send_transient(ctx, error_reply(err)).await?;
    Ok(())
}

pub(crate) async fn send_text(ctx: Context<'_>, text: impl Display) -> CommandResult {
    ctx.send(text_reply(text)).await?;
    Ok(())
}

/// Defer the reply, check the invoker's voice channel against the bot's and return the
/// guild's session, joining the invoker's channel when the bot is not connected.
///
/// Returns `None` when the request was rejected; the reason has been sent already.
pub(crate) async fn process_join(ctx: Context<'_>) -> Result<Option<SessionHandle>, Error> {
    ctx.defer().await?;

    match join_session(ctx).await {
        Ok(handle) => Ok(Some(handle)),
        Err(e) => {
            info!("Rejected /{} from {}: {}", ctx.command().qualified_name, ctx.author().id, e);
            send_error(ctx, e).await?;
            Ok(None)
        }
    }
}

async fn join_session(ctx: Context<'_>) -> MusicResult<SessionHandle> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let serenity_ctx = ctx.serenity_context();

    let bot_id = serenity_ctx.cache.current_user().id;
    let member_channel = user_voice_channel(serenity_ctx, guild_id, ctx.author().id)?;
    let bot_channel = user_voice_channel(serenity_ctx, guild_id, bot_id)?;

    // The cache may lag an in-flight join; `connect` checks again under the session lock.
    let voice_channel = match admit(member_channel, bot_channel)? {
        VoiceAdmission::Join(channel_id) => {
            debug!("Joining {} for {} in guild {}", channel_id, ctx.author().id, guild_id);
            channel_id
        }
        VoiceAdmission::AlreadyConnected(channel_id) => channel_id,
    };

    ctx.data()
        .registry
        .connect(guild_id, voice_channel, ctx.channel_id())
        .await
}
