//! # Looptimer Core Library
//!
//! This library provides the core logic of the Looptimer interval workout
//! timer. Screens are a thin layer over it: they read resolved settings,
//! render them, and call one of the engine's entry points.
//!
//! ## Architecture
//!
//! - **Storage**: key-value persistence of per-workout settings records
//!   (SQLite or in-memory) and TOML-based engine configuration
//! - **Settings**: the per-workout → last-used → defaults resolution chain,
//!   block composition and field-level editing
//! - **Timer**: session descriptors and a tick-driven Green/Red state machine
//!   with rep/set tracking, owned by a tokio driver task
//! - **Summaries**: history of completed workouts
//!
//! ## Key Components
//!
//! - [`WorkoutEngine`]: Facade used by the presentation layer
//! - [`SettingsResolver`]: Always-complete configuration resolution
//! - [`SessionDescriptor`]: Immutable snapshot used to start a run
//! - [`WorkoutTimer`]: Core timer state machine

pub mod error;
pub mod events;
pub mod logging;
pub mod settings;
pub mod storage;
pub mod summary;
pub mod timer;
pub mod workout;

pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use settings::{
    Block, BlockComposer, BlockKind, BlockSettings, DefaultCard, FieldEdit, PersistFailure,
    SettingsEditor, SettingsResolver, WorkoutConfiguration, DEFAULT_WORKOUT_ID,
};
pub use storage::{EngineConfig, KvBackend, MemoryBackend, SettingsStore, SqliteBackend};
pub use summary::{SummaryLog, WorkoutSummary};
pub use timer::{
    spawn_driver, Phase, RunState, SessionDescriptor, SessionMode, SpeedOverride, Targets,
    TimerHandle, WorkoutTimer,
};
pub use workout::WorkoutEngine;
