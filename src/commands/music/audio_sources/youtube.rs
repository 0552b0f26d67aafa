//! YouTube lookups through the `yt-dlp` command-line tool.

use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use super::{AudioSource, PlaylistMetadata, TrackMetadata};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

const YOUTUBE_RESULTS_URL: &str = "https://www.youtube.com/results";
/// YouTube search filter selecting playlists only
const PLAYLIST_FILTER: &str = "EgIQAw==";

/// One video as printed by `yt-dlp -j`, or one entry of a flat playlist
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<YtDlpThumbnail>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: String,
}

/// A playlist (or a search results page) as printed by `yt-dlp -J --flat-playlist`
#[derive(Debug, Deserialize)]
struct YtDlpPlaylist {
    title: Option<String>,
    webpage_url: Option<String>,
    #[serde(default)]
    thumbnails: Vec<YtDlpThumbnail>,
    #[serde(default)]
    entries: Vec<YtDlpEntry>,
}

impl YtDlpEntry {
    fn page_url(&self) -> Option<String> {
        self.webpage_url
            .clone()
            .or_else(|| self.url.clone())
            .or_else(|| {
                self.id
                    .as_ref()
                    .map(|id| format!("https://www.youtube.com/watch?v={}", id))
            })
    }

    fn into_metadata(self) -> Option<TrackMetadata> {
        let url = self.page_url()?;
        let duration = self
            .duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or_default();
        let thumbnail = self
            .thumbnail
            .or_else(|| self.thumbnails.last().map(|t| t.url.clone()));

        Some(TrackMetadata {
            title: self.title.unwrap_or_else(|| "NaN".to_string()),
            url,
            duration,
            thumbnail,
        })
    }
}

/// Parse the output of `yt-dlp -j` for a single video. Empty output means no result.
fn parse_track(stdout: &[u8]) -> MusicResult<Option<TrackMetadata>> {
    let text = String::from_utf8_lossy(stdout);
    let Some(line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };

    let entry: YtDlpEntry = serde_json::from_str(line).map_err(|e| {
        MusicError::AudioSourceError(format!("Failed to parse video metadata: {}", e))
    })?;
    Ok(entry.into_metadata())
}

fn parse_playlist(stdout: &[u8]) -> MusicResult<YtDlpPlaylist> {
    serde_json::from_slice(stdout).map_err(|e| {
        MusicError::AudioSourceError(format!("Failed to parse playlist metadata: {}", e))
    })
}

/// Search page URL listing playlists that match `query`
fn playlist_search_url(query: &str) -> MusicResult<String> {
    let mut url = Url::parse(YOUTUBE_RESULTS_URL)
        .map_err(|e| MusicError::AudioSourceError(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("search_query", query)
        .append_pair("sp", PLAYLIST_FILTER);
    Ok(url.into())
}

/// The `yt-dlp` argument naming a single video: the URL itself or a one-result search
fn single_video_target(query: &str) -> String {
    if AudioSource::is_url(query) {
        query.to_string()
    } else {
        format!("ytsearch1:{}", query)
    }
}

/// Runs `yt-dlp` to look up videos and playlists.
#[derive(Debug, Clone)]
pub struct YoutubeApi {
    program: String,
}

impl Default for YoutubeApi {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }
}

impl YoutubeApi {
    /// Use another `yt-dlp` executable (path or name on `PATH`)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}
