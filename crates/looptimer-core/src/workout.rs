//! Engine facade consumed by the presentation layer.
//!
//! Bundles settings resolution, block composition, the tick driver and the
//! summary log behind one handle.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::settings::{
    Block, BlockComposer, BlockSettings, DefaultCard, PersistFailure, SettingsEditor,
    SettingsResolver, WorkoutConfiguration, DEFAULT_WORKOUT_ID,
};
use crate::storage::{EngineConfig, MemoryBackend, SettingsStore, StorageBackendKind};
use crate::summary::{SummaryLog, WorkoutSummary};
use crate::timer::{spawn_driver, RunState, SessionDescriptor, SpeedOverride, TimerHandle};

pub struct WorkoutEngine {
    config: EngineConfig,
    resolver: SettingsResolver,
    composer: BlockComposer,
    timer: TimerHandle,
    summaries: SummaryLog,
}

impl WorkoutEngine {
    /// Build an engine over `store`. Must be called inside a tokio runtime.
    pub fn new(config: EngineConfig, store: SettingsStore) -> Self {
        let resolver = SettingsResolver::new(store.clone());
        let composer = BlockComposer::new(resolver.clone());
        let timer = spawn_driver();
        let summaries = SummaryLog::new(store, config.summary_history_limit);
        tokio::spawn(record_completions(timer.events(), summaries.clone()));
        Self {
            config,
            resolver,
            composer,
            timer,
            summaries,
        }
    }

    /// Build an engine over the store `config` points at.
    pub fn open(config: EngineConfig) -> Result<Self, CoreError> {
        let store = config.open_store()?;
        Ok(Self::new(config, store))
    }

    /// Engine with volatile storage.
    pub fn in_memory() -> Self {
        let mut config = EngineConfig::default();
        config.storage.backend = StorageBackendKind::Memory;
        Self::new(config, SettingsStore::new(Arc::new(MemoryBackend::new())))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &SettingsResolver {
        &self.resolver
    }

    pub fn composer(&self) -> &BlockComposer {
        &self.composer
    }

    pub fn summaries(&self) -> &SummaryLog {
        &self.summaries
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub async fn resolve(&self, workout_id: &str) -> WorkoutConfiguration {
        self.resolver.resolve(workout_id).await
    }

    pub async fn save(&self, config: &WorkoutConfiguration) -> Result<(), CoreError> {
        Ok(self.resolver.save(config).await?)
    }

    pub async fn add_block(
        &self,
        workout_id: &str,
        settings: BlockSettings,
        title: Option<String>,
    ) -> Result<Block, CoreError> {
        self.composer.add_block(workout_id, settings, title).await
    }

    pub async fn update_block(
        &self,
        workout_id: &str,
        block_id: &str,
        settings: BlockSettings,
    ) -> Result<Block, CoreError> {
        self.composer
            .update_block(workout_id, block_id, settings)
            .await
    }

    pub async fn remove_block(&self, workout_id: &str, block_id: &str) -> Result<bool, CoreError> {
        self.composer.remove_block(workout_id, block_id).await
    }

    pub async fn hide_default_block(
        &self,
        workout_id: &str,
        card: DefaultCard,
    ) -> Result<bool, CoreError> {
        self.composer.hide_default_block(workout_id, card).await
    }

    /// Field-level editor for `workout_id` plus its failure channel.
    pub async fn editor(
        &self,
        workout_id: &str,
    ) -> (SettingsEditor, mpsc::UnboundedReceiver<PersistFailure>) {
        SettingsEditor::open(self.resolver.clone(), workout_id).await
    }

    // ── Descriptors ──────────────────────────────────────────────────

    fn name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.config.default_workout_name)
    }

    pub fn build_fixed(
        &self,
        config: &WorkoutConfiguration,
        name: Option<&str>,
        triple_tracking: bool,
        speed: Option<SpeedOverride>,
    ) -> Result<SessionDescriptor, ValidationError> {
        SessionDescriptor::build_fixed(config, Some(self.name(name)), triple_tracking, speed)
    }

    pub fn build_infinite_loop(
        &self,
        config: &WorkoutConfiguration,
        name: Option<&str>,
        loop_seconds: Option<u32>,
        loop_tick_millis: Option<u64>,
    ) -> Result<SessionDescriptor, ValidationError> {
        SessionDescriptor::build_infinite_loop(
            config,
            Some(self.name(name)),
            loop_seconds,
            loop_tick_millis,
        )
    }

    // ── Runs ─────────────────────────────────────────────────────────

    /// Resolve `workout_id` and start a tracked fixed session.
    pub async fn start_workout(
        &self,
        workout_id: &str,
        name: Option<&str>,
    ) -> Result<u64, CoreError> {
        let config = self.resolve(workout_id).await;
        let descriptor = self.build_fixed(&config, name, true, None)?;
        self.start(descriptor).await
    }

    /// Start the quick-start workout with optional tracking and pace override.
    pub async fn quick_start(
        &self,
        triple_tracking: bool,
        speed: Option<SpeedOverride>,
    ) -> Result<u64, CoreError> {
        let config = self.resolve(DEFAULT_WORKOUT_ID).await;
        let descriptor = self.build_fixed(&config, None, triple_tracking, speed)?;
        self.start(descriptor).await
    }

    /// Start a session from one block card of `workout_id`.
    pub async fn start_block(
        &self,
        workout_id: &str,
        block_id: &str,
        name: Option<&str>,
    ) -> Result<u64, CoreError> {
        let config = self.resolve(workout_id).await;
        let block = config
            .block(block_id)
            .ok_or_else(|| CoreError::BlockNotFound {
                workout_id: workout_id.to_string(),
                block_id: block_id.to_string(),
            })?;
        let name = name
            .or(block.title.as_deref())
            .unwrap_or(&self.config.default_workout_name);
        let descriptor = SessionDescriptor::build_from_block(&config, Some(name), block)?;
        self.start(descriptor).await
    }

    pub async fn start_infinite_loop(
        &self,
        workout_id: &str,
        loop_seconds: Option<u32>,
        loop_tick_millis: Option<u64>,
    ) -> Result<u64, CoreError> {
        let config = self.resolve(workout_id).await;
        let descriptor = self.build_infinite_loop(&config, None, loop_seconds, loop_tick_millis)?;
        self.start(descriptor).await
    }

    /// Start `descriptor`; returns the new epoch.
    pub async fn start(&self, descriptor: SessionDescriptor) -> Result<u64, CoreError> {
        self.timer.start(descriptor).await
    }

    pub async fn pause(&self) -> Result<bool, CoreError> {
        self.timer.pause().await
    }

    pub async fn resume(&self) -> Result<bool, CoreError> {
        self.timer.resume().await
    }

    pub async fn stop(&self) -> Result<bool, CoreError> {
        self.timer.stop().await
    }

    pub fn snapshot(&self) -> RunState {
        self.timer.snapshot()
    }

    pub async fn snapshot_event(&self) -> Result<Event, CoreError> {
        self.timer.snapshot_event().await
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.timer.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.timer.events()
    }

    pub async fn recent_summaries(&self) -> Result<Vec<WorkoutSummary>, CoreError> {
        Ok(self.summaries.list().await?)
    }
}

async fn record_completions(mut events: broadcast::Receiver<Event>, log: SummaryLog) {
    loop {
        match events.recv().await {
            Ok(Event::SessionCompleted { summary, .. }) => {
                if let Err(e) = log.append(&summary).await {
                    tracing::warn!(workout_id = %summary.workout_id, error = %e, "failed to record workout summary");
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "summary recorder lagged behind timer events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LoopSettings, TimeSettings};
    use crate::timer::{Phase, SessionMode};

    #[tokio::test]
    async fn quick_start_uses_default_workout() {
        let engine = WorkoutEngine::in_memory();
        let mut quick = engine.resolve(DEFAULT_WORKOUT_ID).await;
        quick.green_seconds = 12;
        engine.save(&quick).await.unwrap();

        let mut events = engine.events();
        assert_eq!(engine.quick_start(false, None).await.unwrap(), 1);
        match events.recv().await.unwrap() {
            Event::SessionStarted {
                workout_id,
                workout_name,
                mode,
                ..
            } => {
                assert_eq!(workout_id, DEFAULT_WORKOUT_ID);
                assert_eq!(workout_name, "Quick Workout");
                assert_eq!(mode, SessionMode::Fixed);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(engine.snapshot().remaining_seconds, 12);
    }

    #[tokio::test]
    async fn start_block_uses_block_settings() {
        let engine = WorkoutEngine::in_memory();
        let block = engine
            .add_block(
                "w",
                BlockSettings::Loop(LoopSettings {
                    loop_seconds: Some(8),
                    loop_tick_millis: Some(250),
                }),
                Some("Burner".into()),
            )
            .await
            .unwrap();
        engine.start_block("w", &block.id, None).await.unwrap();
        let s = engine.snapshot();
        assert_eq!(s.phase, Phase::Green);
        assert_eq!(s.remaining_seconds, 8);

        assert!(matches!(
            engine.start_block("w", "ghost", None).await,
            Err(CoreError::BlockNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_override_does_not_start() {
        let engine = WorkoutEngine::in_memory();
        let speed = SpeedOverride {
            green_tick_millis: Some(0),
            red_tick_millis: None,
        };
        assert!(matches!(
            engine.quick_start(false, Some(speed)).await,
            Err(CoreError::Validation(_))
        ));
        assert_eq!(engine.snapshot().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn block_edits_flow_through_facade() {
        let engine = WorkoutEngine::in_memory();
        let block = engine
            .add_block(
                "w",
                BlockSettings::Time(TimeSettings {
                    green_seconds: Some(40),
                    red_seconds: None,
                }),
                None,
            )
            .await
            .unwrap();
        assert!(engine.hide_default_block("w", DefaultCard::Time).await.unwrap());
        assert!(engine.remove_block("w", &block.id).await.unwrap());
        let config = engine.resolve("w").await;
        assert!(config.custom_blocks.is_empty());
        assert!(config.is_hidden(DefaultCard::Time));
    }
}
