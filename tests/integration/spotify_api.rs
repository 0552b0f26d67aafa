use glovedbot::commands::music::audio_sources::spotify::{SpotifyApi, SpotifyTrack};
use glovedbot::commands::music::utils::music_manager::MusicError;
use glovedbot::config::SpotifyCredentials;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils;
use crate::{assert_eq, assert_matches};

fn credentials() -> SpotifyCredentials {
    SpotifyCredentials {
        client_id: "cid".to_string(),
        client_secret: "secret".to_string(),
    }
}

async fn setup() -> (MockServer, SpotifyApi) {
    test_utils::init();
    let server = MockServer::start().await;
    let api = SpotifyApi::with_base_urls(
        credentials(),
        reqwest::Client::new(),
        server.uri(),
        server.uri(),
    );
    (server, api)
}

async fn mount_token(server: &MockServer, expected_requests: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", "Basic Y2lkOnNlY3JldA=="))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_requests)
        .mount(server)
        .await;
}

fn track_json(id: Option<&str>, name: &str, artist: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "name": artist }]
    })
}

#[tokio::test]
async fn test_single_track_reuses_cached_token() {
    let (server, api) = setup().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/tracks/abc123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_json(Some("abc123"), "Around the World", "Daft Punk")),
        )
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let tracks = api
            .get_tracks("https://open.spotify.com/track/abc123", 50)
            .await
            .unwrap();
        assert_eq!(
            tracks,
            vec![SpotifyTrack {
                name: "Around the World".to_string(),
                artists: vec!["Daft Punk".to_string()],
            }]
        );
    }
}

#[tokio::test]
async fn test_playlist_follows_pages_and_skips_local_files() {
    let (server, api) = setup().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/playlists/pl1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": track_json(Some("t1"), "One", "Artist A") },
                { "track": track_json(None, "Local file", "Me") },
                { "track": null }
            ],
            "next": format!("{}/pages/pl1/2", server.uri())
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pages/pl1/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": track_json(Some("t2"), "Two", "Artist B") }
            ],
            "next": null
        })))
        .mount(&server)
        .await;

    let tracks = api
        .get_tracks("https://open.spotify.com/playlist/pl1?si=share", 50)
        .await
        .unwrap();
    let queries: Vec<String> = tracks.iter().map(SpotifyTrack::youtube_query).collect();
    assert_eq!(queries, vec!["One by Artist A", "Two by Artist B"]);
}

#[tokio::test]
async fn test_album_stops_at_limit() {
    let (server, api) = setup().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/albums/al1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                track_json(Some("t1"), "One", "Band"),
                track_json(Some("t2"), "Two", "Band"),
                track_json(Some("t3"), "Three", "Band")
            ],
            "next": format!("{}/pages/al1/2", server.uri())
        })))
        .mount(&server)
        .await;

    // The limit is reached on the first page, so the second is never requested
    Mock::given(method("GET"))
        .and(path("/pages/al1/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let tracks = api
        .get_tracks("https://open.spotify.com/album/al1", 2)
        .await
        .unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].name, "Two");
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let (server, api) = setup().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/tracks/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = api
        .get_tracks("https://open.spotify.com/track/missing", 50)
        .await
        .unwrap_err();
    assert_matches!(err, MusicError::ExternalApiError(ref message) if message.contains("404"));
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (server, api) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_client"
        })))
        .mount(&server)
        .await;

    let err = api
        .get_tracks("https://open.spotify.com/track/abc123", 50)
        .await
        .unwrap_err();
    assert_matches!(err, MusicError::ExternalApiError(_));
}

#[tokio::test]
async fn test_invalid_link_makes_no_requests() {
    let (server, api) = setup().await;
    mount_token(&server, 0).await;

    let err = api
        .get_tracks("https://open.spotify.com/artist/abc123", 50)
        .await
        .unwrap_err();
    assert_matches!(err, MusicError::NotFound(_));
}
