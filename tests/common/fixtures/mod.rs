//! Sample data used across the integration tests

use std::time::Duration;

use glovedbot::commands::music::audio_sources::{Track, TrackMetadata};
use poise::serenity_prelude::{ChannelId, GuildId, UserId};

/// Sample user ID for testing
pub const SAMPLE_USER_ID: u64 = 123456789;

/// Sample voice channel ID for testing
pub const SAMPLE_CHANNEL_ID: u64 = 987654321;

/// Text channel commands are issued from
pub const SAMPLE_TEXT_CHANNEL_ID: u64 = 987650000;

/// Sample guild ID for testing
pub const SAMPLE_GUILD_ID: u64 = 555000111;

pub fn guild() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

pub fn voice_channel() -> ChannelId {
    ChannelId::new(SAMPLE_CHANNEL_ID)
}

/// A second voice channel in the sample guild
pub fn other_voice_channel() -> ChannelId {
    ChannelId::new(SAMPLE_CHANNEL_ID + 1)
}

pub fn text_channel() -> ChannelId {
    ChannelId::new(SAMPLE_TEXT_CHANNEL_ID)
}

pub fn metadata(title: &str, seconds: u64) -> TrackMetadata {
    TrackMetadata {
        title: title.to_string(),
        url: format!("https://www.youtube.com/watch?v={}", title.to_lowercase()),
        duration: Duration::from_secs(seconds),
        thumbnail: None,
    }
}

/// A three minute track requested by the sample user
pub fn track(title: &str) -> Track {
    track_with_duration(title, 180)
}

pub fn track_with_duration(title: &str, seconds: u64) -> Track {
    Track::new(metadata(title, seconds), UserId::new(SAMPLE_USER_ID), None)
}

pub fn tracks(titles: &[&str]) -> Vec<Track> {
    titles.iter().map(|title| track(title)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_track() {
        let track = track("Intro");
        assert_eq!(track.duration, Duration::from_secs(180));
        assert_eq!(track.requested_by, UserId::new(SAMPLE_USER_ID));
        assert!(track.seek_offset.is_none());
    }
}
