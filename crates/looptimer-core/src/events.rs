use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::WorkoutSummary;
use crate::timer::{Phase, RunState, SessionMode};

/// Every timer state change produces an Event.
/// The presentation layer renders from them; the engine records summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        epoch: u64,
        workout_id: String,
        workout_name: String,
        mode: SessionMode,
        at: DateTime<Utc>,
    },
    SessionPaused {
        epoch: u64,
        phase: Phase,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        epoch: u64,
        phase: Phase,
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        epoch: u64,
        from: Phase,
        to: Phase,
        current_set: u32,
        current_rep: u32,
        at: DateTime<Utc>,
    },
    /// A red phase ended in a tracked session.
    RepCompleted {
        epoch: u64,
        set: u32,
        rep: u32,
        at: DateTime<Utc>,
    },
    SetCompleted {
        epoch: u64,
        set: u32,
        at: DateTime<Utc>,
    },
    /// Terminal event of a tracked fixed session.
    SessionCompleted {
        epoch: u64,
        summary: Box<WorkoutSummary>,
        at: DateTime<Utc>,
    },
    SessionStopped {
        epoch: u64,
        /// Phase the session was in when stopped.
        phase: Phase,
        elapsed_total_seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: RunState,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Epoch of the run this event belongs to.
    pub fn epoch(&self) -> u64 {
        match self {
            Event::SessionStarted { epoch, .. }
            | Event::SessionPaused { epoch, .. }
            | Event::SessionResumed { epoch, .. }
            | Event::PhaseChanged { epoch, .. }
            | Event::RepCompleted { epoch, .. }
            | Event::SetCompleted { epoch, .. }
            | Event::SessionCompleted { epoch, .. }
            | Event::SessionStopped { epoch, .. } => *epoch,
            Event::StateSnapshot { state, .. } => state.epoch,
        }
    }
}
