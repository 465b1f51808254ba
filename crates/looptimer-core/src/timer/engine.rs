//! Workout timer engine implementation.
//!
//! The timer is a tick-driven state machine. It does not use internal
//! threads or clocks - the caller delivers one `tick(epoch)` per elapsed
//! pace interval (see [`spawn_driver`](super::spawn_driver) for a driver).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Green -> Red -> (Green | Completed)
//! ```
//!
//! `paused` is orthogonal to the phase. Infinite-loop sessions never reach
//! `Completed`; `stop()` returns any session to `Idle`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = WorkoutTimer::new();
//! let epoch = timer.start(descriptor).epoch();
//! // Once per pace interval:
//! for event in timer.tick(epoch) { /* ... */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::descriptor::{SessionDescriptor, SessionMode};
use crate::events::Event;
use crate::summary::WorkoutSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Green,
    Red,
    Completed,
}

impl Phase {
    pub fn is_live(self) -> bool {
        matches!(self, Phase::Green | Phase::Red)
    }
}

/// Live state of the current (or last) run.
///
/// Accumulators survive `stop()` so they can be read for reporting; the next
/// `start()` discards them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub epoch: u64,
    pub phase: Phase,
    pub paused: bool,
    pub elapsed_green_seconds: u64,
    pub elapsed_red_seconds: u64,
    pub elapsed_total_seconds: u64,
    /// Sum of the paces of every applied tick.
    pub elapsed_millis: u64,
    pub current_set: u32,
    pub current_rep: u32,
    pub is_recovery_subphase: bool,
    /// Countdown units left in the active phase.
    pub remaining_seconds: u32,
}

impl RunState {
    fn idle(epoch: u64) -> Self {
        Self {
            epoch,
            phase: Phase::Idle,
            paused: false,
            elapsed_green_seconds: 0,
            elapsed_red_seconds: 0,
            elapsed_total_seconds: 0,
            elapsed_millis: 0,
            current_set: 0,
            current_rep: 0,
            is_recovery_subphase: false,
            remaining_seconds: 0,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::idle(0)
    }
}

/// Simulated duration of one finished green or red phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub phase: Phase,
    pub millis: u64,
}

/// Core workout timer.
#[derive(Debug, Clone, Default)]
pub struct WorkoutTimer {
    descriptor: Option<SessionDescriptor>,
    state: RunState,
    started_at: Option<DateTime<Utc>>,
    /// Milliseconds spent in the active phase so far.
    span_millis: u64,
    phase_log: Vec<PhaseSpan>,
}

impl WorkoutTimer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.state.epoch
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn descriptor(&self) -> Option<&SessionDescriptor> {
        self.descriptor.as_ref()
    }

    /// Finished phases of the current run, oldest first.
    pub fn phase_log(&self) -> &[PhaseSpan] {
        &self.phase_log
    }

    /// Whether ticks currently advance the run.
    pub fn is_running(&self) -> bool {
        self.state.phase.is_live() && !self.state.paused
    }

    /// Pace of the active phase, `None` when not in Green or Red.
    pub fn tick_millis(&self) -> Option<u64> {
        self.descriptor.as_ref()?.tick_millis(self.state.phase)
    }

    /// 0.0 .. 1.0 progress of a tracked session (always 0.0 otherwise).
    pub fn progress(&self) -> f64 {
        if self.state.phase == Phase::Completed {
            return 1.0;
        }
        let planned = match self.descriptor.as_ref().and_then(|d| d.planned_units()) {
            Some(p) if p > 0 => p,
            _ => return 0.0,
        };
        (self.state.elapsed_total_seconds as f64 / planned as f64).min(1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state.clone(),
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new run under a fresh epoch.
    ///
    /// A live run is stopped first, so the returned events may begin with
    /// `SessionStopped`.
    pub fn start(&mut self, descriptor: SessionDescriptor) -> Vec<Event> {
        let mut events = Vec::with_capacity(2);
        events.extend(self.stop());

        let epoch = self.state.epoch + 1;
        let phase = descriptor.start_phase();
        self.state = RunState {
            phase,
            current_set: 1,
            current_rep: 1,
            remaining_seconds: descriptor.phase_seconds(phase),
            ..RunState::idle(epoch)
        };
        self.span_millis = 0;
        self.phase_log.clear();
        self.started_at = Some(Utc::now());

        tracing::info!(
            epoch,
            workout_id = descriptor.workout_id(),
            mode = ?descriptor.mode(),
            tracking = descriptor.triple_tracking_enabled(),
            "session started"
        );
        events.push(Event::SessionStarted {
            epoch,
            workout_id: descriptor.workout_id().to_string(),
            workout_name: descriptor.workout_name().to_string(),
            mode: descriptor.mode(),
            at: Utc::now(),
        });
        self.descriptor = Some(descriptor);
        events
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.state.paused = true;
        Some(Event::SessionPaused {
            epoch: self.state.epoch,
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if !(self.state.phase.is_live() && self.state.paused) {
            return None;
        }
        self.state.paused = false;
        Some(Event::SessionResumed {
            epoch: self.state.epoch,
            phase: self.state.phase,
            remaining_seconds: self.state.remaining_seconds,
            at: Utc::now(),
        })
    }

    /// Return to `Idle` from any phase, freezing the accumulators.
    pub fn stop(&mut self) -> Option<Event> {
        if self.state.phase == Phase::Idle {
            return None;
        }
        let from = self.state.phase;
        self.state.phase = Phase::Idle;
        self.state.paused = false;
        tracing::info!(
            epoch = self.state.epoch,
            elapsed = self.state.elapsed_total_seconds,
            "session stopped"
        );
        Some(Event::SessionStopped {
            epoch: self.state.epoch,
            phase: from,
            elapsed_total_seconds: self.state.elapsed_total_seconds,
            at: Utc::now(),
        })
    }

    /// Apply one countdown unit.
    ///
    /// Ticks from another epoch, ticks while paused and ticks outside Green
    /// or Red change nothing.
    pub fn tick(&mut self, epoch: u64) -> Vec<Event> {
        if epoch != self.state.epoch {
            tracing::warn!(epoch, current = self.state.epoch, "dropping stale tick");
            return Vec::new();
        }
        if !self.is_running() {
            return Vec::new();
        }
        let Some(pace) = self.tick_millis() else {
            return Vec::new();
        };

        let s = &mut self.state;
        s.remaining_seconds = s.remaining_seconds.saturating_sub(1);
        s.elapsed_total_seconds += 1;
        s.elapsed_millis += pace;
        match s.phase {
            Phase::Green => s.elapsed_green_seconds += 1,
            Phase::Red => s.elapsed_red_seconds += 1,
            _ => {}
        }
        self.span_millis += pace;

        if self.state.remaining_seconds == 0 {
            self.exhaust_phase()
        } else {
            Vec::new()
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn exhaust_phase(&mut self) -> Vec<Event> {
        let Some(descriptor) = self.descriptor.clone() else {
            return Vec::new();
        };
        let finished = self.state.phase;
        self.phase_log.push(PhaseSpan {
            phase: finished,
            millis: self.span_millis,
        });
        self.span_millis = 0;

        let targets = match descriptor.mode() {
            SessionMode::Fixed => descriptor.targets(),
            SessionMode::InfiniteLoop => None,
        };
        let epoch = self.state.epoch;
        let mut events = Vec::new();

        let next = match (finished, targets) {
            (Phase::Green, tracked) => {
                self.state.is_recovery_subphase = tracked.is_some();
                Phase::Red
            }
            (Phase::Red, None) => Phase::Green,
            (Phase::Red, Some(t)) => {
                self.state.is_recovery_subphase = false;
                events.push(Event::RepCompleted {
                    epoch,
                    set: self.state.current_set,
                    rep: self.state.current_rep,
                    at: Utc::now(),
                });
                self.state.current_rep += 1;
                if self.state.current_rep > t.reps {
                    events.push(Event::SetCompleted {
                        epoch,
                        set: self.state.current_set,
                        at: Utc::now(),
                    });
                    self.state.current_rep = 1;
                    self.state.current_set += 1;
                }
                if self.state.current_set > t.sets {
                    self.state.current_set = t.sets;
                    self.state.current_rep = t.reps;
                    Phase::Completed
                } else {
                    Phase::Green
                }
            }
            _ => return events,
        };

        self.state.phase = next;
        self.state.remaining_seconds = descriptor.phase_seconds(next);
        tracing::debug!(
            epoch,
            from = ?finished,
            to = ?next,
            set = self.state.current_set,
            rep = self.state.current_rep,
            "phase changed"
        );
        events.push(Event::PhaseChanged {
            epoch,
            from: finished,
            to: next,
            current_set: self.state.current_set,
            current_rep: self.state.current_rep,
            at: Utc::now(),
        });

        if next == Phase::Completed {
            let summary = WorkoutSummary::from_run(
                &descriptor,
                &self.state,
                &self.phase_log,
                self.started_at.unwrap_or_else(Utc::now),
            );
            tracing::info!(epoch, workout_id = descriptor.workout_id(), "session completed");
            events.push(Event::SessionCompleted {
                epoch,
                summary: Box::new(summary),
                at: Utc::now(),
            });
        }
        events
    }
}
