use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use std::fmt::Display;
use std::time::Duration;

use super::format_duration;
use super::playback_engine::PlayerStatus;
use super::queue_manager::{RepeatMode, SessionSnapshot};
use crate::commands::music::audio_sources::Track;

/// Tracks listed per queue page
pub const QUEUE_PAGE_SIZE: usize = 10;

const ERROR_COLOR: u32 = 0xff0000;

/// Create a progress bar for the current track
pub fn format_progress_bar(position: Duration, total: Duration) -> String {
    const BAR_LENGTH: usize = 15;
    let progress = if total.is_zero() {
        0.0
    } else {
        (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    };

    let filled = (progress * BAR_LENGTH as f64).round() as usize;
    let empty = BAR_LENGTH - filled;

    format!("▬{}🔘{}▬", "▬".repeat(filled), "▬".repeat(empty))
}

fn track_link(track: &Track) -> String {
    format!("[{}]({})", track.title, track.url)
}

fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::Off => "Off",
        RepeatMode::One => "Current track",
        RepeatMode::All => "Whole queue",
    }
}

fn status_label(status: PlayerStatus) -> &'static str {
    match status {
        PlayerStatus::Idle => "⏹️ Idle",
        PlayerStatus::Playing => "▶️ Playing",
        PlayerStatus::Paused => "⏸️ Paused",
    }
}

/// Embed for a single enqueued song
pub fn enqueued_song(track: &Track, color: u32) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("Enqueued")
        .description(format!(
            "Enqueued song **{} ({})**",
            track.title,
            format_duration(track.duration)
        ))
        .color(color);

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Embed for several songs enqueued at once
pub fn enqueued_many(
    count: usize,
    playlist_title: Option<&str>,
    thumbnail: Option<&str>,
    color: u32,
) -> CreateEmbed {
    let source = match playlist_title {
        Some(title) => format!("playlist **{}**", title),
        None => "spotify playlist".to_string(),
    };

    let mut embed = CreateEmbed::new()
        .title("Enqueued")
        .description(format!("Enqueued  **{}** songs from {}", count, source))
        .color(color);

    if let Some(thumbnail) = thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// "`position`/`duration`" line used by the current-track and seek replies
pub fn playback_line(track: &Track, position: Duration) -> String {
    format!(
        "Playing **{}** from **{}/{}**",
        track.title,
        format_duration(position),
        format_duration(track.duration)
    )
}

/// Embed describing the current track and how far into it playback is
pub fn current_track(track: &Track, position: Duration, color: u32) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("Current Track")
        .description(format!(
            "{}\n{}",
            playback_line(track, position),
            format_progress_bar(position, track.duration)
        ))
        .color(color);

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.image(thumbnail);
    }
    embed
}

pub fn seeked(track: &Track, offset: Duration, color: u32) -> CreateEmbed {
    CreateEmbed::new()
        .title("Seeked")
        .description(playback_line(track, offset))
        .color(color)
}

/// Number of queue pages, at least one
pub fn page_count(queue_len: usize) -> usize {
    queue_len.div_ceil(QUEUE_PAGE_SIZE).max(1)
}

/// Body of one queue page. `page` is 1-based and clamped to the available pages.
pub fn queue_page_description(snapshot: &SessionSnapshot, page: usize) -> String {
    let mut description = String::new();

    match &snapshot.current {
        Some(track) => {
            description.push_str("**🎵 Now Playing**\n");
            description.push_str(&format!("**{}**", track_link(track)));
            if let Some(position) = snapshot.position {
                description.push_str(&format!(
                    " `{}/{}`",
                    format_duration(position),
                    format_duration(track.duration)
                ));
            }
            description.push_str("\n\n");
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if snapshot.queue.is_empty() {
        description.push_str("**📭 Queue is empty**");
        return description;
    }

    let pages = page_count(snapshot.queue.len());
    let page = page.clamp(1, pages);
    let start = (page - 1) * QUEUE_PAGE_SIZE;

    description.push_str(&format!(
        "**📋 Queue - {} tracks**\n",
        snapshot.queue.len()
    ));
    for (index, track) in snapshot
        .queue
        .iter()
        .enumerate()
        .skip(start)
        .take(QUEUE_PAGE_SIZE)
    {
        description.push_str(&format!(
            "`{}.` {} `{}`\n",
            index + 1,
            track_link(track),
            format_duration(track.duration)
        ));
    }

    description.push_str(&format!(
        "\n**⏱️ Total Duration:** `{}`",
        format_duration(snapshot.queue_duration())
    ));
    if pages > 1 {
        description.push_str(&format!("\nPage {}/{}", page, pages));
    }

    description
}

/// Create an embed for the music queue
pub fn music_queue(snapshot: &SessionSnapshot, page: usize, color: u32) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(queue_page_description(snapshot, page))
        .color(color)
}

/// Body of the player control message
pub fn player_description(snapshot: &SessionSnapshot) -> String {
    let mut description = match &snapshot.current {
        Some(track) => {
            let position = snapshot.position.unwrap_or_default();
            format!(
                "**{}**\n{} `{}/{}`\n",
                track_link(track),
                format_progress_bar(position, track.duration),
                format_duration(position),
                format_duration(track.duration)
            )
        }
        None => "**🔇 Nothing playing**\n".to_string(),
    };

    description.push_str(&format!(
        "\n{} · 🔊 {}% · 🔁 {}",
        status_label(snapshot.status),
        snapshot.volume,
        repeat_label(snapshot.repeat)
    ));

    if let Some(next) = snapshot.queue.first() {
        description.push_str(&format!(
            "\n\n**Up next:** {} ({} in queue)",
            track_link(next),
            snapshot.queue.len()
        ));
    }

    description
}

/// Create the embed of the player control message
pub fn player_embed(snapshot: &SessionSnapshot, color: u32) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("🎶 Music Player")
        .description(player_description(snapshot))
        .color(color);

    if let Some(thumbnail) = snapshot.current.as_ref().and_then(|t| t.thumbnail.as_ref()) {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Create an error reply
pub fn error_reply(err: impl Display) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(format!("> {}", err))
            .color(ERROR_COLOR),
    )
}

/// A plain quoted reply
pub fn text_reply(text: impl Display) -> CreateReply {
    CreateReply::default().content(format!("> {}", text))
}
