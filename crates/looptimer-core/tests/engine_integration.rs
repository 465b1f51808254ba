//! End-to-end tests through `WorkoutEngine`: settings edits, driven runs on a
//! paused tokio clock, and summary recording.

use std::sync::Arc;
use std::time::Duration;

use looptimer_core::storage::{EngineConfig, StorageBackendKind};
use looptimer_core::{
    CoreError, Event, MemoryBackend, Phase, SettingsStore, WorkoutEngine, DEFAULT_WORKOUT_ID,
};

fn engine_with_backend() -> (Arc<MemoryBackend>, WorkoutEngine) {
    looptimer_core::logging::init_test_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let mut config = EngineConfig::default();
    config.storage.backend = StorageBackendKind::Memory;
    config.summary_history_limit = 5;
    let engine = WorkoutEngine::new(config, SettingsStore::new(backend.clone()));
    (backend, engine)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn tracked_workout_runs_to_completion_and_is_recorded() {
    let (_, engine) = engine_with_backend();
    let (mut editor, _failures) = engine.editor("pushups").await;
    editor.set_green_seconds(2).unwrap();
    editor.set_red_seconds(1).unwrap();
    editor.set_green_pace_seconds(0.5).unwrap();
    editor.set_target_sets(2).unwrap();
    editor.set_target_reps(2).unwrap();
    editor.set_weight_kg(10.0).unwrap();
    editor.flush().await;

    let mut events = engine.events();
    engine.start_workout("pushups", Some("Pushups")).await.unwrap();

    // Per rep: 2 x 500 ms green + 1 x 1000 ms red.
    advance(4 * 2_000 + 500).await;
    assert_eq!(engine.snapshot().phase, Phase::Completed);

    let mut completed = None;
    while let Ok(event) = events.try_recv() {
        if let Event::SessionCompleted { summary, .. } = event {
            completed = Some(summary);
        }
    }
    let summary = completed.expect("session completed");
    assert_eq!(summary.elapsed_millis, 8_000);
    assert_eq!(summary.total_volume_kg, 2.0 * 2.0 * 10.0);

    let mut recorded = Vec::new();
    for _ in 0..50 {
        recorded = engine.recent_summaries().await.unwrap();
        if !recorded.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].id, summary.id);
    assert_eq!(
        engine
            .resolver()
            .last_active_workout_id()
            .await
            .unwrap()
            .as_deref(),
        Some("pushups")
    );
}

#[tokio::test(start_paused = true)]
async fn storage_failure_does_not_disturb_a_running_session() {
    let (backend, engine) = engine_with_backend();
    engine.quick_start(false, None).await.unwrap();
    advance(5_500).await;

    backend.set_read_failure(true);
    backend.set_write_failure(true);
    let mut c = engine.resolve(DEFAULT_WORKOUT_ID).await;
    c.green_seconds = 3;
    assert!(matches!(engine.save(&c).await, Err(CoreError::Storage(_))));

    advance(10_000).await;
    let s = engine.snapshot();
    assert_eq!(s.phase, Phase::Green);
    assert_eq!(s.elapsed_total_seconds, 15);
    assert_eq!(s.remaining_seconds, 15);
}

#[tokio::test(start_paused = true)]
async fn pause_resume_and_restart_through_the_engine() {
    let (_, engine) = engine_with_backend();
    let mut states = engine.subscribe();

    let first = engine.start_infinite_loop("loop", Some(4), Some(250)).await.unwrap();
    advance(600).await;
    assert!(engine.pause().await.unwrap());
    let paused = engine.snapshot();
    assert_eq!(paused.elapsed_total_seconds, 2);

    advance(5_000).await;
    assert_eq!(engine.snapshot(), paused);
    assert!(engine.resume().await.unwrap());

    let second = engine.quick_start(true, None).await.unwrap();
    assert_eq!(second, first + 1);
    assert!(states.has_changed().unwrap());
    let s = states.borrow_and_update().clone();
    assert_eq!(s.epoch, second);
    assert_eq!(s.elapsed_total_seconds, 0);

    assert!(engine.stop().await.unwrap());
    assert_eq!(engine.snapshot().phase, Phase::Idle);
}

#[tokio::test]
async fn engine_opens_configured_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.storage.database_path = Some(dir.path().join("engine.db"));

    {
        let engine = WorkoutEngine::open(config.clone()).unwrap();
        let mut c = engine.resolve("w").await;
        c.red_seconds = 42;
        engine.save(&c).await.unwrap();
    }

    let engine = WorkoutEngine::open(config).unwrap();
    assert_eq!(engine.resolve("w").await.red_seconds, 42);
    assert_eq!(engine.resolve("unseen").await.red_seconds, 42);
}
