//! Track discovery: turning a user query into playable track descriptors.
//!
//! [`TrackResolver`] is the seam the commands talk to; [`MediaResolver`] implements it
//! with `yt-dlp` for YouTube and the Spotify Web API for Spotify links.

pub mod spotify;
pub mod track_metadata;
pub mod youtube;

use async_trait::async_trait;
use futures::future::join_all;
use poise::serenity_prelude::UserId;
use tracing::{info, warn};
use url::Url;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use spotify::SpotifyApi;
use youtube::YoutubeApi;

pub use track_metadata::{PlaylistMetadata, Track, TrackMetadata};

/// Looks up tracks from free text or URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// The track a URL points at, or the best match for a search term.
    async fn search_one(&self, query: &str) -> MusicResult<Option<TrackMetadata>>;

    /// The playlist a URL points at, or the first playlist matching a search term.
    async fn search_playlist(&self, query: &str) -> MusicResult<Option<PlaylistMetadata>>;

    /// Every playable track behind an external (Spotify) link.
    async fn resolve_external_playlist(&self, url: &str) -> MusicResult<Vec<TrackMetadata>>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Whether the input is an http(s) URL rather than search text
    pub fn is_url(input: &str) -> bool {
        Url::parse(input.trim())
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }
}

/// [`TrackResolver`] backed by YouTube (`yt-dlp`) and, when configured, Spotify
pub struct MediaResolver {
    youtube: YoutubeApi,
    spotify: Option<SpotifyApi>,
    max_playlist_tracks: usize,
}

impl MediaResolver {
    pub fn new(youtube: YoutubeApi, spotify: Option<SpotifyApi>, max_playlist_tracks: usize) -> Self {
        Self {
            youtube,
            spotify,
            max_playlist_tracks: max_playlist_tracks.max(1),
        }
    }
}

#[async_trait]
impl TrackResolver for MediaResolver {
    async fn search_one(&self, query: &str) -> MusicResult<Option<TrackMetadata>> {
        self.youtube.search_one(query).await
    }

    async fn search_playlist(&self, query: &str) -> MusicResult<Option<PlaylistMetadata>> {
        self.youtube
            .search_playlist(query, self.max_playlist_tracks)
            .await
    }

    async fn resolve_external_playlist(&self, url: &str) -> MusicResult<Vec<TrackMetadata>> {
        let spotify = self.spotify.as_ref().ok_or_else(|| {
            MusicError::ConfigError("Spotify credentials are not configured".to_string())
        })?;

        let tracks = spotify.get_tracks(url, self.max_playlist_tracks).await?;
        info!("Looking up {} Spotify track(s) on YouTube", tracks.len());

        let lookups = tracks.iter().map(|track| async move {
            let query = track.youtube_query();
            match self.youtube.search_one(&query).await {
                Ok(Some(video)) => Some(video),
                Ok(None) => {
                    warn!("No YouTube match for '{}'", query);
                    None
                }
                Err(e) => {
                    warn!("YouTube lookup for '{}' failed: {}", query, e);
                    None
                }
            }
        });

        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }
}

/// What a playback command asked for
#[derive(Debug, Clone, PartialEq)]
pub enum TrackRequest {
    Song(String),
    Playlist(String),
    Spotify(String),
}

/// Tracks produced for a request, plus what to tell the user about them
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTracks {
    pub tracks: Vec<Track>,
    /// Playlist title, when the tracks came from a playlist
    pub playlist_title: Option<String>,
    pub thumbnail: Option<String>,
}

/// Resolve a request into queue entries requested by `user`, each starting at `seek`.
///
/// Nothing found is reported as [`MusicError::NotFound`] with the message shown to the user.
pub async fn resolve_request(
    resolver: &dyn TrackResolver,
    request: &TrackRequest,
    user: UserId,
    seek: Option<f64>,
) -> MusicResult<ResolvedTracks> {
    let to_tracks = |videos: Vec<TrackMetadata>| -> Vec<Track> {
        videos
            .into_iter()
            .map(|video| Track::new(video, user, seek))
            .collect()
    };

    match request {
        TrackRequest::Song(query) => {
            let video = resolver.search_one(query).await?.ok_or_else(|| {
                MusicError::NotFound(format!("Could not found song with keyword: `{}`", query))
            })?;
            let thumbnail = video.thumbnail.clone();
            Ok(ResolvedTracks {
                tracks: to_tracks(vec![video]),
                playlist_title: None,
                thumbnail,
            })
        }
        TrackRequest::Playlist(query) => {
            let playlist = resolver
                .search_playlist(query)
                .await?
                .filter(|playlist| !playlist.videos.is_empty())
                .ok_or_else(|| MusicError::NotFound("The playlist could not be found".to_string()))?;
            Ok(ResolvedTracks {
                tracks: to_tracks(playlist.videos),
                playlist_title: Some(playlist.title),
                thumbnail: playlist.thumbnail,
            })
        }
        TrackRequest::Spotify(url) => {
            let videos = resolver.resolve_external_playlist(url).await?;
            if videos.is_empty() {
                return Err(MusicError::NotFound(
                    "None of the tracks of this Spotify link could be found on YouTube".to_string(),
                ));
            }
            Ok(ResolvedTracks {
                tracks: to_tracks(videos),
                playlist_title: None,
                thumbnail: None,
            })
        }
    }
}
