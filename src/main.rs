use std::collections::HashSet;
use std::sync::Arc;

use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use glovedbot::commands::general::embed::embed;
use glovedbot::commands::music::audio_sources::spotify::SpotifyApi;
use glovedbot::commands::music::audio_sources::youtube::YoutubeApi;
use glovedbot::commands::music::audio_sources::{MediaResolver, TrackResolver};
use glovedbot::commands::music::music;
use glovedbot::commands::music::utils::event_handlers::pump_track_end_events;
use glovedbot::commands::music::utils::music_manager::SessionRegistry;
use glovedbot::commands::music::utils::playback_engine::SongbirdEngine;
use glovedbot::config::BotConfig;
use glovedbot::events::Handler;
use glovedbot::{CommandResult, Context, Data, Error, HTTP_CLIENT};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("glovedbot=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Arc::new(BotConfig::from_env()?);

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    // Voice playback: one engine, one registry, one consumer of track completions
    let songbird = Songbird::serenity();
    let (ended_tx, ended_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(SongbirdEngine::new(
        songbird.clone(),
        HTTP_CLIENT.clone(),
        ended_tx,
    ));
    let registry = Arc::new(SessionRegistry::new(engine, config.default_volume));
    tokio::spawn(pump_track_end_events(registry.clone(), ended_rx));

    let spotify = match &config.spotify {
        Some(credentials) => Some(SpotifyApi::new(credentials.clone(), HTTP_CLIENT.clone())),
        None => {
            info!("Spotify credentials not set, /music spotify is disabled");
            None
        }
    };
    let resolver: Arc<dyn TrackResolver> = Arc::new(MediaResolver::new(
        YoutubeApi::default(),
        spotify,
        config.max_playlist_tracks,
    ));

    let commands = vec![
        // Default commands
        register(),
        help(),
        // General commands
        embed(),
        // Music commands
        music(),
    ];

    let data_config = config.clone();
    let data_registry = registry.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            owners: config.owner_id.into_iter().collect::<HashSet<_>>(),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("{} is connected as {}", data_config.bot_name, ready.user.name);
                Ok(Data {
                    config: data_config,
                    registry: data_registry,
                    resolver,
                })
            })
        });

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .framework(framework.build())
        .event_handler(Handler {
            registry: registry.clone(),
            config: config.clone(),
        })
        .register_songbird_with(songbird)
        .await?;

    client.start().await.map_err(Into::into)
}
