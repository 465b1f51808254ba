//! Workout settings: the configuration model, its resolution chain, block
//! composition and field-level editing.

mod block;
mod composer;
mod editor;
mod model;
mod resolver;

pub use block::{
    generate_block_id, Block, BlockKind, BlockSettings, DefaultCard, LapSettings, LoopSettings,
    SpeedSettings, TimeSettings, WeightSettings,
};
pub use composer::BlockComposer;
pub use editor::{PersistFailure, SettingsEditor};
pub use model::{
    FieldEdit, WorkoutConfiguration, DEFAULT_GREEN_REPS, DEFAULT_GREEN_SECONDS,
    DEFAULT_LOOP_SECONDS, DEFAULT_RED_REPS, DEFAULT_RED_SECONDS, DEFAULT_TARGET_REPS,
    DEFAULT_TARGET_SETS, DEFAULT_TICK_MILLIS, DEFAULT_WEIGHT_KG, DEFAULT_WORKOUT_ID,
};
pub use resolver::SettingsResolver;
