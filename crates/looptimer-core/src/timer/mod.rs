mod descriptor;
mod driver;
mod engine;
mod pace;

pub use descriptor::{SessionDescriptor, SessionMode, SpeedOverride, Targets, DEFAULT_WORKOUT_NAME};
pub use driver::{spawn_driver, TimerHandle};
pub use engine::{Phase, PhaseSpan, RunState, WorkoutTimer};
pub use pace::{format_pace, millis_to_seconds, seconds_to_millis};
