//! Immutable session descriptors.
//!
//! A descriptor is built once per start from a resolved configuration and
//! optional run-time overrides. The timer never sees a zero duration or pace:
//! every builder validates before returning.

use serde::{Deserialize, Serialize};

use super::engine::Phase;
use crate::error::ValidationError;
use crate::settings::{Block, BlockSettings, WorkoutConfiguration};

/// Workout name used when the caller does not supply one.
pub const DEFAULT_WORKOUT_NAME: &str = "Quick Workout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Fixed,
    InfiniteLoop,
}

/// Set/rep goal of a triple-tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    pub sets: u32,
    pub reps: u32,
}

/// Quick-start pace override, in milliseconds. Durations are never touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedOverride {
    pub green_tick_millis: Option<u64>,
    pub red_tick_millis: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    workout_id: String,
    workout_name: String,
    mode: SessionMode,
    green_seconds: u32,
    red_seconds: u32,
    green_tick_millis: u64,
    red_tick_millis: u64,
    loop_seconds: u32,
    loop_tick_millis: u64,
    /// `Some` only when triple tracking is on.
    targets: Option<Targets>,
    weight_kg: f64,
}

impl SessionDescriptor {
    /// Fixed session from `config`, optionally with a pace override.
    pub fn build_fixed(
        config: &WorkoutConfiguration,
        name: Option<&str>,
        triple_tracking: bool,
        speed: Option<SpeedOverride>,
    ) -> Result<Self, ValidationError> {
        let speed = speed.unwrap_or_default();
        let targets = triple_tracking.then_some(Targets {
            sets: config.target_sets,
            reps: config.target_reps,
        });
        Self::base(config, name, SessionMode::Fixed, targets)
            .with_paces(speed.green_tick_millis, speed.red_tick_millis)
            .validated()
    }

    /// Unbounded loop session. Green/red fields still carry the
    /// configuration's values for display.
    pub fn build_infinite_loop(
        config: &WorkoutConfiguration,
        name: Option<&str>,
        loop_seconds: Option<u32>,
        loop_tick_millis: Option<u64>,
    ) -> Result<Self, ValidationError> {
        let mut descriptor = Self::base(config, name, SessionMode::InfiniteLoop, None);
        if let Some(v) = loop_seconds {
            descriptor.loop_seconds = v;
        }
        if let Some(v) = loop_tick_millis {
            descriptor.loop_tick_millis = v;
        }
        descriptor.validated()
    }

    /// Session started from a single block card.
    ///
    /// A loop block starts an infinite loop with the block's fields; any other
    /// block is laid over the configuration and starts a tracked fixed session.
    pub fn build_from_block(
        config: &WorkoutConfiguration,
        name: Option<&str>,
        block: &Block,
    ) -> Result<Self, ValidationError> {
        block.settings.validate()?;
        match block.settings {
            BlockSettings::Loop(l) => {
                Self::build_infinite_loop(config, name, l.loop_seconds, l.loop_tick_millis)
            }
            _ => {
                let mut overlaid = config.clone();
                block.settings.apply_to(&mut overlaid);
                let name = name.or(block.title.as_deref());
                Self::build_fixed(&overlaid, name, true, None)
            }
        }
    }

    fn base(
        config: &WorkoutConfiguration,
        name: Option<&str>,
        mode: SessionMode,
        targets: Option<Targets>,
    ) -> Self {
        Self {
            workout_id: config.workout_id.clone(),
            workout_name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(DEFAULT_WORKOUT_NAME)
                .to_string(),
            mode,
            green_seconds: config.green_seconds,
            red_seconds: config.red_seconds,
            green_tick_millis: config.green_tick_millis,
            red_tick_millis: config.red_tick_millis,
            loop_seconds: config.infinite_loop_seconds,
            loop_tick_millis: config.infinite_loop_tick_millis,
            targets,
            weight_kg: config.weight_kg,
        }
    }

    fn with_paces(mut self, green: Option<u64>, red: Option<u64>) -> Self {
        if let Some(v) = green {
            self.green_tick_millis = v;
        }
        if let Some(v) = red {
            self.red_tick_millis = v;
        }
        self
    }

    fn validated(self) -> Result<Self, ValidationError> {
        let counts = [
            ("green_seconds", self.green_seconds),
            ("red_seconds", self.red_seconds),
            ("loop_seconds", self.loop_seconds),
        ];
        for (field, v) in counts {
            if v == 0 {
                return Err(ValidationError::NonPositive { field });
            }
        }
        let paces = [
            ("green_tick_millis", self.green_tick_millis),
            ("red_tick_millis", self.red_tick_millis),
            ("loop_tick_millis", self.loop_tick_millis),
        ];
        for (field, v) in paces {
            if v == 0 {
                return Err(ValidationError::NonPositive { field });
            }
        }
        if let Some(t) = self.targets {
            if t.sets == 0 {
                return Err(ValidationError::NonPositive { field: "target_sets" });
            }
            if t.reps == 0 {
                return Err(ValidationError::NonPositive { field: "target_reps" });
            }
        }
        Ok(self)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    pub fn workout_name(&self) -> &str {
        &self.workout_name
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn green_seconds(&self) -> u32 {
        self.green_seconds
    }

    pub fn red_seconds(&self) -> u32 {
        self.red_seconds
    }

    pub fn green_tick_millis(&self) -> u64 {
        self.green_tick_millis
    }

    pub fn red_tick_millis(&self) -> u64 {
        self.red_tick_millis
    }

    pub fn loop_seconds(&self) -> u32 {
        self.loop_seconds
    }

    pub fn loop_tick_millis(&self) -> u64 {
        self.loop_tick_millis
    }

    pub fn targets(&self) -> Option<Targets> {
        self.targets
    }

    pub fn triple_tracking_enabled(&self) -> bool {
        self.targets.is_some()
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn start_phase(&self) -> Phase {
        Phase::Green
    }

    /// Countdown units in one `phase` of this session.
    pub fn phase_seconds(&self, phase: Phase) -> u32 {
        match (self.mode, phase) {
            (SessionMode::InfiniteLoop, Phase::Green | Phase::Red) => self.loop_seconds,
            (SessionMode::Fixed, Phase::Green) => self.green_seconds,
            (SessionMode::Fixed, Phase::Red) => self.red_seconds,
            _ => 0,
        }
    }

    /// Milliseconds per countdown unit while in `phase`.
    pub fn tick_millis(&self, phase: Phase) -> Option<u64> {
        match (self.mode, phase) {
            (SessionMode::InfiniteLoop, Phase::Green | Phase::Red) => Some(self.loop_tick_millis),
            (SessionMode::Fixed, Phase::Green) => Some(self.green_tick_millis),
            (SessionMode::Fixed, Phase::Red) => Some(self.red_tick_millis),
            _ => None,
        }
    }

    /// Total countdown units of a tracked session; `None` when unbounded.
    pub fn planned_units(&self) -> Option<u64> {
        let t = self.targets?;
        let per_rep = u64::from(self.green_seconds) + u64::from(self.red_seconds);
        Some(u64::from(t.sets) * u64::from(t.reps) * per_rep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LapSettings, LoopSettings, SpeedSettings};

    fn config() -> WorkoutConfiguration {
        let mut c = WorkoutConfiguration::defaults("w");
        c.green_seconds = 30;
        c.red_seconds = 15;
        c
    }

    #[test]
    fn fixed_copies_configuration() {
        let d = SessionDescriptor::build_fixed(&config(), Some("Squats"), false, None).unwrap();
        assert_eq!(d.workout_id(), "w");
        assert_eq!(d.workout_name(), "Squats");
        assert_eq!(d.mode(), SessionMode::Fixed);
        assert_eq!((d.green_seconds(), d.red_seconds()), (30, 15));
        assert!(!d.triple_tracking_enabled());
        assert_eq!(d.targets(), None);
        assert_eq!(d.start_phase(), Phase::Green);
    }

    #[test]
    fn tracking_seeds_targets() {
        let d = SessionDescriptor::build_fixed(&config(), None, true, None).unwrap();
        assert_eq!(d.targets(), Some(Targets { sets: 3, reps: 6 }));
        assert_eq!(d.workout_name(), DEFAULT_WORKOUT_NAME);
        assert_eq!(d.planned_units(), Some(3 * 6 * 45));
    }

    #[test]
    fn speed_override_replaces_only_paces() {
        let speed = SpeedOverride {
            green_tick_millis: Some(500),
            red_tick_millis: None,
        };
        let d = SessionDescriptor::build_fixed(&config(), None, false, Some(speed)).unwrap();
        assert_eq!(d.green_tick_millis(), 500);
        assert_eq!(d.red_tick_millis(), 1000);
        assert_eq!(d.green_seconds(), 30);
    }

    #[test]
    fn zero_values_are_rejected() {
        let speed = SpeedOverride {
            green_tick_millis: Some(0),
            red_tick_millis: None,
        };
        assert_eq!(
            SessionDescriptor::build_fixed(&config(), None, false, Some(speed)),
            Err(ValidationError::NonPositive {
                field: "green_tick_millis"
            })
        );
        let mut c = config();
        c.red_seconds = 0;
        assert!(SessionDescriptor::build_fixed(&c, None, false, None).is_err());
        assert!(SessionDescriptor::build_infinite_loop(&config(), None, Some(0), None).is_err());
    }

    #[test]
    fn infinite_loop_keeps_fixed_fields_for_display() {
        let d =
            SessionDescriptor::build_infinite_loop(&config(), None, Some(20), Some(250)).unwrap();
        assert_eq!(d.mode(), SessionMode::InfiniteLoop);
        assert_eq!((d.loop_seconds(), d.loop_tick_millis()), (20, 250));
        assert_eq!((d.green_seconds(), d.red_seconds()), (30, 15));
        assert_eq!(d.phase_seconds(Phase::Red), 20);
        assert_eq!(d.tick_millis(Phase::Green), Some(250));
        assert_eq!(d.planned_units(), None);
    }

    #[test]
    fn loop_block_starts_infinite_loop() {
        let block = Block::new(
            BlockSettings::Loop(LoopSettings {
                loop_seconds: Some(12),
                loop_tick_millis: None,
            }),
            None,
        );
        let d = SessionDescriptor::build_from_block(&config(), None, &block).unwrap();
        assert_eq!(d.mode(), SessionMode::InfiniteLoop);
        assert_eq!(d.loop_seconds(), 12);
        assert_eq!(d.loop_tick_millis(), 1000);
    }

    #[test]
    fn lap_block_sets_targets() {
        let block = Block::new(
            BlockSettings::Lap(LapSettings {
                green_reps: Some(4),
                red_reps: Some(2),
            }),
            Some("Ladder".into()),
        );
        let d = SessionDescriptor::build_from_block(&config(), None, &block).unwrap();
        assert_eq!(d.mode(), SessionMode::Fixed);
        assert_eq!(d.targets(), Some(Targets { sets: 4, reps: 2 }));
        assert_eq!(d.workout_name(), "Ladder");
    }

    #[test]
    fn speed_block_overlays_paces() {
        let block = Block::new(
            BlockSettings::Speed(SpeedSettings {
                green_tick_millis: None,
                red_tick_millis: Some(300),
            }),
            None,
        );
        let d = SessionDescriptor::build_from_block(&config(), Some("Sprint"), &block).unwrap();
        assert_eq!(d.red_tick_millis(), 300);
        assert_eq!(d.green_tick_millis(), 1000);
        assert!(d.triple_tracking_enabled());
    }
}
