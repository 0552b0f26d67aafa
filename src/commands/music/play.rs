use poise::CreateReply;
use tracing::{debug, error, info};

use super::audio_sources::{TrackRequest, resolve_request};
use super::utils::embedded_messages::{enqueued_many, enqueued_song};
use super::utils::music_manager::MusicError;
use super::{process_join, send_error};
use crate::{CommandResult, Context};

const GENERIC_FAILURE: &str =
    "I apologize, but I am currently unable to process your request. Please try again later.";

/// Play a song
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "song url or title"] song: String,
    #[description = "Start song from specific time"]
    #[min = 0]
    seek: Option<f64>,
) -> CommandResult {
    enqueue_request(ctx, TrackRequest::Song(song), seek).await
}

/// Play youtube playlist
#[poise::command(slash_command, category = "Music")]
pub async fn playlist(
    ctx: Context<'_>,
    #[description = "Playlist name or url"] playlist: String,
    #[description = "Start song from specific time"]
    #[min = 0]
    seek: Option<f64>,
) -> CommandResult {
    enqueue_request(ctx, TrackRequest::Playlist(playlist), seek).await
}

/// Play a spotify link
#[poise::command(slash_command, category = "Music")]
pub async fn spotify(
    ctx: Context<'_>,
    #[description = "Spotify url"] url: String,
    #[description = "Start song from specific time"]
    #[min = 0]
    seek: Option<f64>,
) -> CommandResult {
    enqueue_request(ctx, TrackRequest::Spotify(url), seek).await
}

/// Resolve the request without holding the session, then enqueue into the same session if it still exists
async fn enqueue_request(
    ctx: Context<'_>,
    request: TrackRequest,
    seek: Option<f64>,
) -> CommandResult {
    info!("Received {:?} from {}", request, ctx.author().id);

    let Some(handle) = process_join(ctx).await? else {
        return Ok(());
    };
    let data = ctx.data();

    let resolved =
        match resolve_request(data.resolver.as_ref(), &request, ctx.author().id, seek).await {
            Ok(resolved) => resolved,
            Err(e) => {
                info!("Nothing to enqueue for {:?}: {}", request, e);
                return send_error(ctx, e).await;
            }
        };

    let count = resolved.tracks.len();
    let Some(first) = resolved.tracks.first().cloned() else {
        return send_error(ctx, MusicError::NotFound("Nothing was found".to_string())).await;
    };

    match data
        .registry
        .enqueue_resolved(handle.guild_id(), handle.epoch(), resolved.tracks)
        .await
    {
        Ok(outcome) => debug!("Enqueue outcome in guild {}: {:?}", handle.guild_id(), outcome),
        Err(MusicError::SessionExpired) => {
            return send_error(ctx, MusicError::SessionExpired).await;
        }
        Err(e) => {
            error!("Failed to start playback in guild {}: {}", handle.guild_id(), e);
            return send_error(ctx, GENERIC_FAILURE).await;
        }
    }

    let color = data.config.primary_color;
    let embed = match request {
        TrackRequest::Song(_) => enqueued_song(&first, color),
        TrackRequest::Playlist(_) | TrackRequest::Spotify(_) => enqueued_many(
            count,
            resolved.playlist_title.as_deref(),
            resolved.thumbnail.as_deref(),
            color,
        ),
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
