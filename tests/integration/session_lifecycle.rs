use std::sync::Arc;
use std::time::Duration;

use glovedbot::commands::music::utils::event_handlers::pump_track_end_events;
use glovedbot::commands::music::utils::music_manager::{MusicError, SessionRegistry};
use glovedbot::commands::music::utils::playback_engine::{PlayerStatus, TrackEnded};
use glovedbot::commands::music::utils::queue_manager::{EnqueueOutcome, RepeatMode, SkipOutcome};

use crate::common::drain_track_ends;
use crate::common::fixtures::{
    guild, other_voice_channel, text_channel, track, track_with_duration, tracks, voice_channel,
};
use crate::common::mocks::{EngineCall, FakeEngine};
use crate::test_utils;
use crate::{assert_eq, assert_matches};
use tokio_test::{assert_err, assert_none, assert_ok, assert_some};

fn setup() -> (
    Arc<FakeEngine>,
    tokio::sync::mpsc::UnboundedReceiver<TrackEnded>,
    SessionRegistry,
) {
    test_utils::init();
    let (engine, ended) = FakeEngine::new();
    let registry = SessionRegistry::new(engine.clone(), 80);
    (engine, ended, registry)
}

#[tokio::test]
async fn test_queue_plays_through_in_order() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    handle.lock().await.join(voice_channel()).await.unwrap();

    let first = registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A"]))
        .await
        .unwrap();
    assert_matches!(first, EnqueueOutcome::Started { ref track, added: 1 } if track.title == "A");

    let second = registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["B", "C"]))
        .await
        .unwrap();
    assert_eq!(second, EnqueueOutcome::Queued { position: 1, added: 2 });

    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    assert_eq!(engine.played_titles(), vec!["A", "B", "C"]);

    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    let snapshot = handle.lock().await.snapshot().await;
    assert!(snapshot.current.is_none());
    assert!(snapshot.queue.is_empty());
    assert_eq!(snapshot.status, PlayerStatus::Idle);

    assert_eq!(engine.calls()[0], EngineCall::Join(voice_channel()));
    assert!(engine.plays().iter().all(|request| request.volume == 80));
}

#[tokio::test]
async fn test_skip_advances_once_and_ignores_stale_end() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B", "C"]))
        .await
        .unwrap();
    let first_play = handle.lock().await.current_play_id().unwrap();

    let outcome = handle.lock().await.skip().await.unwrap();
    assert_matches!(outcome, SkipOutcome::Skipped(ref track) if track.title == "A");

    // The stop notification drives the advance
    assert_eq!(drain_track_ends(&registry, &mut ended).await, 1);
    assert_eq!(engine.played_titles(), vec!["A", "B"]);

    // A late duplicate for the skipped playback changes nothing
    registry
        .handle_track_end(TrackEnded {
            guild_id: guild(),
            epoch: handle.epoch(),
            play_id: first_play,
        })
        .await;
    let snapshot = handle.lock().await.snapshot().await;
    assert_eq!(snapshot.current.map(|t| t.title), Some("B".to_string()));
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(engine.played_titles(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_skipping_last_track_stops_playback() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["Solo"]))
        .await
        .unwrap();

    let outcome = handle.lock().await.skip().await.unwrap();
    assert_matches!(outcome, SkipOutcome::Stopped(_));
    drain_track_ends(&registry, &mut ended).await;

    let session = handle.lock().await;
    assert!(session.current_track().is_none());
    assert_eq!(session.status(), PlayerStatus::Idle);
    assert_eq!(engine.played_titles(), vec!["Solo"]);
}

#[tokio::test]
async fn test_repeat_one_replays_until_skipped() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    handle.lock().await.set_repeat_mode(RepeatMode::One);
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();

    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    assert_eq!(engine.played_titles(), vec!["A", "A"]);

    handle.lock().await.skip().await.unwrap();
    drain_track_ends(&registry, &mut ended).await;
    assert_eq!(engine.played_titles(), vec!["A", "A", "B"]);
}

#[tokio::test]
async fn test_repeat_all_cycles_the_queue() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    handle.lock().await.set_repeat_mode(RepeatMode::All);
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();

    for _ in 0..3 {
        engine.finish(guild());
        drain_track_ends(&registry, &mut ended).await;
    }
    assert_eq!(engine.played_titles(), vec!["A", "B", "A", "B"]);
}

#[tokio::test]
async fn test_seek_restarts_current_track_at_offset() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(
            guild(),
            handle.epoch(),
            vec![track_with_duration("Long", 200), track("Next")],
        )
        .await
        .unwrap();

    let seeked = handle.lock().await.seek(30.0).await.unwrap();
    assert_eq!(seeked.seek_offset, Some(30.0));
    drain_track_ends(&registry, &mut ended).await;

    let plays = engine.plays();
    assert_eq!(plays.len(), 2);
    assert_eq!(plays[1].track.title, "Long");
    assert_eq!(plays[1].track.seek_offset, Some(30.0));

    let err = handle.lock().await.seek(500.0).await.unwrap_err();
    assert_eq!(
        err,
        MusicError::InvalidSeekOffset {
            max: Duration::from_secs(200)
        }
    );

    // The replayed track finishes normally and the queue moves on
    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    assert_eq!(engine.played_titles(), vec!["Long", "Long", "Next"]);
}

#[tokio::test]
async fn test_pause_and_resume_transitions() {
    let (engine, _ended, registry) = setup();
    let handle = registry.get_or_create(guild());

    assert_eq!(
        handle.lock().await.pause().await.unwrap_err(),
        MusicError::NothingPlaying
    );

    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A"]))
        .await
        .unwrap();

    let mut session = handle.lock().await;
    assert_ok!(session.pause().await);
    assert_eq!(session.pause().await.unwrap_err(), MusicError::AlreadyPaused);
    assert_eq!(session.toggle_pause().await.unwrap(), PlayerStatus::Playing);
    assert_eq!(session.unpause().await.unwrap_err(), MusicError::NotPaused);
    drop(session);

    let calls = engine.calls();
    assert!(calls.contains(&EngineCall::Pause));
    assert!(calls.contains(&EngineCall::Unpause));
}

#[tokio::test]
async fn test_volume_is_clamped_and_used_for_next_track() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();

    assert_eq!(handle.lock().await.set_volume(150).await.unwrap(), 100);
    assert_eq!(handle.lock().await.set_volume(25).await.unwrap(), 25);

    engine.finish(guild());
    drain_track_ends(&registry, &mut ended).await;
    assert_eq!(engine.plays()[1].volume, 25);
}

#[tokio::test]
async fn test_failed_autoplay_rolls_back_enqueue() {
    let (engine, _ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    engine.set_fail_play(true);

    let err = registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap_err();
    assert_matches!(err, MusicError::Engine(_));

    let snapshot = handle.lock().await.snapshot().await;
    assert!(snapshot.current.is_none());
    assert!(snapshot.queue.is_empty());
}

#[tokio::test]
async fn test_teardown_leaves_voice_and_expires_late_requests() {
    let (engine, mut ended, registry) = setup();
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();

    assert_some!(registry.teardown(guild()).await);
    assert_none!(registry.teardown(guild()).await);
    assert_err!(handle.lock().await.skip().await);
    assert!(registry.is_empty());
    assert!(engine.calls().contains(&EngineCall::Leave));

    // Tracks resolved for the old session must not resurrect it
    let err = registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["Late"]))
        .await
        .unwrap_err();
    assert_eq!(err, MusicError::SessionExpired);

    // A fresh session starts clean with a new epoch
    let fresh = registry.get_or_create(guild());
    assert_ne!(fresh.epoch(), handle.epoch());
    drain_track_ends(&registry, &mut ended).await;
    assert!(fresh.lock().await.current_track().is_none());
    assert_eq!(engine.played_titles(), vec!["A"]);
}

#[tokio::test]
async fn test_completion_from_closed_session_is_ignored() {
    let (engine, _ended, registry) = setup();
    let old = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), old.epoch(), tracks(&["OLD"]))
        .await
        .unwrap();
    let old_play = old.lock().await.current_play_id().unwrap();
    assert_some!(registry.teardown(guild()).await);

    let fresh = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), fresh.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();
    // Play ids restart with every session
    assert_eq!(fresh.lock().await.current_play_id(), Some(old_play));

    // The voice driver reports the old playback's end only now
    registry
        .handle_track_end(TrackEnded {
            guild_id: guild(),
            epoch: old.epoch(),
            play_id: old_play,
        })
        .await;

    let session = fresh.lock().await;
    assert_eq!(
        session.current_track().map(|t| t.title.clone()),
        Some("A".to_string())
    );
    assert_eq!(session.queue().len(), 1);
    drop(session);
    assert_eq!(engine.played_titles(), vec!["OLD", "A"]);
}

#[tokio::test]
async fn test_connect_keeps_first_voice_channel() {
    let (engine, _ended, registry) = setup();

    let handle = registry
        .connect(guild(), voice_channel(), text_channel())
        .await
        .unwrap();
    let err = registry
        .connect(guild(), other_voice_channel(), text_channel())
        .await
        .unwrap_err();
    assert_eq!(err, MusicError::WrongVoiceChannel);

    let joins: Vec<_> = engine
        .calls()
        .into_iter()
        .filter(|call| matches!(call, EngineCall::Join(_)))
        .collect();
    assert_eq!(joins, vec![EngineCall::Join(voice_channel())]);
    assert_eq!(handle.lock().await.bound_channel(), Some(text_channel()));
}

#[tokio::test]
async fn test_pump_delivers_track_ends() {
    let (engine, ended, registry) = setup();
    let registry = Arc::new(registry);
    let handle = registry.get_or_create(guild());
    registry
        .enqueue_resolved(guild(), handle.epoch(), tracks(&["A", "B"]))
        .await
        .unwrap();

    let pump = tokio::spawn(pump_track_end_events(registry.clone(), ended));
    engine.finish(guild());

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if engine.played_titles().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pump did not deliver the track end");

    assert_eq!(
        handle.lock().await.current_track().map(|t| t.title.clone()),
        Some("B".to_string())
    );
    pump.abort();
}
