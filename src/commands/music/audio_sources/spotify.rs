//! Spotify Web API client: client-credentials authentication, URL parsing and
//! track listing for track, album and playlist links.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::config::SpotifyCredentials;

const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const API_URL: &str = "https://api.spotify.com/v1";
const PAGE_SIZE: usize = 50;

static SPOTIFY_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:open\.spotify\.com/(?:intl-[a-z]{2}(?:-[A-Za-z]{2})?/)?|spotify:)(track|album|playlist)[/:]([a-zA-Z0-9]+)(?:\?.*)?$",
    )
    .unwrap()
});

/// What a Spotify link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyLink {
    Track(String),
    Album(String),
    Playlist(String),
}

impl SpotifyLink {
    /// Recognize `open.spotify.com` URLs and `spotify:` URIs.
    pub fn parse(url: &str) -> Option<Self> {
        let captures = SPOTIFY_URL_REGEX.captures(url.trim())?;
        let id = captures.get(2)?.as_str().to_string();
        match captures.get(1)?.as_str() {
            "track" => Some(Self::Track(id)),
            "album" => Some(Self::Album(id)),
            "playlist" => Some(Self::Playlist(id)),
            _ => None,
        }
    }
}

/// Name and artists of one Spotify track
#[derive(Clone, Debug, PartialEq)]
pub struct SpotifyTrack {
    pub name: String,
    pub artists: Vec<String>,
}

impl SpotifyTrack {
    /// Query used to find the track on YouTube
    pub fn youtube_query(&self) -> String {
        format!("{} by {}", self.name, self.artists.join(", "))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Tokens are renewed 30 seconds before they actually expire.
    fn is_expired(&self) -> bool {
        Instant::now() + Duration::from_secs(30) >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    /// Absent for local files
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<TrackObject>,
}

impl From<TrackObject> for SpotifyTrack {
    fn from(track: TrackObject) -> Self {
        Self {
            name: track.name,
            artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        }
    }
}

fn playable(track: TrackObject) -> Option<SpotifyTrack> {
    track.id.is_some().then(|| track.into())
}

/// Client for the parts of the Spotify Web API the bot uses.
pub struct SpotifyApi {
    credentials: SpotifyCredentials,
    http: reqwest::Client,
    accounts_url: String,
    api_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyApi {
    pub fn new(credentials: SpotifyCredentials, http: reqwest::Client) -> Self {
        Self::with_base_urls(credentials, http, ACCOUNTS_URL, API_URL)
    }

    /// Client talking to other endpoints, e.g. a local mock server.
    pub fn with_base_urls(
        credentials: SpotifyCredentials,
        http: reqwest::Client,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            http,
            accounts_url: accounts_url.into(),
            api_url: api_url.into(),
            token: Mutex::new(None),
        }
    }

    /// Return the cached access token, requesting a new one when missing or expired
    async fn access_token(&self) -> MusicResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.access_token.clone());
        }

        debug!("Requesting a new Spotify access token");
        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;
        let token: TokenResponse = Self::read_json(response, "token").await?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> MusicResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Cannot read response".to_string());
            return Err(MusicError::ExternalApiError(format!(
                "Spotify API error: {} - {}",
                status, text
            )));
        }

        response.json::<T>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify {}: {}", what, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> MusicResult<T> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify {}: {}", what, e))
            })?;
        Self::read_json(response, what).await
    }

    /// Follow `next` links from `first_page`, stopping after `limit` tracks
    async fn collect_pages<T, F>(
        &self,
        first_page: String,
        limit: usize,
        what: &str,
        mut extract: F,
    ) -> MusicResult<Vec<SpotifyTrack>>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Option<SpotifyTrack>,
    {
        let mut tracks = Vec::new();
        let mut next = Some(first_page);

        while let Some(url) = next.take() {
            let page: Paging<T> = self.get(&url, what).await?;
            tracks.extend(page.items.into_iter().filter_map(&mut extract));

            if tracks.len() >= limit {
                tracks.truncate(limit);
                break;
            }
            next = page.next;
        }

        Ok(tracks)
    }

    pub async fn get_track(&self, track_id: &str) -> MusicResult<SpotifyTrack> {
        let url = format!("{}/tracks/{}", self.api_url, track_id);
        let track: TrackObject = self.get(&url, "track").await?;
        Ok(track.into())
    }

    pub async fn get_album_tracks(
        &self,
        album_id: &str,
        limit: usize,
    ) -> MusicResult<Vec<SpotifyTrack>> {
        let url = format!(
            "{}/albums/{}/tracks?limit={}",
            self.api_url, album_id, PAGE_SIZE
        );
        self.collect_pages(url, limit, "album", playable).await
    }

    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> MusicResult<Vec<SpotifyTrack>> {
        let url = format!(
            "{}/playlists/{}/tracks?limit={}",
            self.api_url, playlist_id, PAGE_SIZE
        );
        self.collect_pages(url, limit, "playlist", |item: PlaylistItem| {
            item.track.and_then(playable)
        })
        .await
    }

    /// Every track behind a Spotify link, at most `limit` of them.
    pub async fn get_tracks(&self, url: &str, limit: usize) -> MusicResult<Vec<SpotifyTrack>> {
        let link = SpotifyLink::parse(url).ok_or_else(|| {
            MusicError::NotFound(
                "The Spotify url you provided appears to be invalid, make sure that you have provided a valid url for Spotify".to_string(),
            )
        })?;
        info!("Fetching Spotify {:?}", link);

        match link {
            SpotifyLink::Track(id) => Ok(vec![self.get_track(&id).await?]),
            SpotifyLink::Album(id) => self.get_album_tracks(&id, limit).await,
            SpotifyLink::Playlist(id) => self.get_playlist_tracks(&id, limit).await,
        }
    }
}
