//! End-to-end behavior of the playback core and the external API clients

mod session_lifecycle;
mod spotify_api;
