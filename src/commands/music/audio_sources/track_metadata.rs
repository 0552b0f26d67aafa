//! Track descriptors produced by the resolvers and the `Track` entries stored in a guild's queue.

use poise::serenity_prelude::UserId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unified representation of a playable track as returned by a resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// The URL handed to the playback engine.
    pub url: String,
    /// Track length. Zero when the source does not report one (e.g. live streams).
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
}

/// A playlist found by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistMetadata {
    pub title: String,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    pub videos: Vec<TrackMetadata>,
}

/// A queued track.
///
/// Everything but `seek_offset` is fixed once enqueued; a seek rewrites the
/// offset and puts the track back at the head of the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub url: String,
    pub duration: Duration,
    pub thumbnail: Option<String>,
    /// Position, in seconds, playback should start from.
    pub seek_offset: Option<f64>,
    pub requested_by: UserId,
}

impl Track {
    pub fn new(metadata: TrackMetadata, requested_by: UserId, seek_offset: Option<f64>) -> Self {
        Self {
            title: metadata.title,
            url: metadata.url,
            duration: metadata.duration,
            thumbnail: metadata.thumbnail,
            seek_offset: seek_offset.filter(|offset| *offset > 0.0),
            requested_by,
        }
    }

    /// The start position as a `Duration`, if the track should not start from the beginning.
    pub fn start_position(&self) -> Option<Duration> {
        self.seek_offset
            .filter(|offset| offset.is_finite() && *offset > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Whether playback can start at `offset_seconds` into this track.
    pub fn accepts_offset(&self, offset_seconds: f64) -> bool {
        offset_seconds.is_finite()
            && offset_seconds >= 0.0
            && Duration::from_secs_f64(offset_seconds) < self.duration
    }
}
