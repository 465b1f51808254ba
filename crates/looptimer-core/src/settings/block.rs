//! Configuration blocks attached to a workout.
//!
//! A block is an independently editable slice of tuning (durations, pace,
//! laps, loop, weight). Payload fields are optional so that an update only
//! carries what changed.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::model::WorkoutConfiguration;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Time,
    Loop,
    Speed,
    Lap,
    Weight,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Time => "time",
            BlockKind::Loop => "loop",
            BlockKind::Speed => "speed",
            BlockKind::Lap => "lap",
            BlockKind::Weight => "weight",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(BlockKind::Time),
            "loop" => Ok(BlockKind::Loop),
            "speed" => Ok(BlockKind::Speed),
            "lap" => Ok(BlockKind::Lap),
            "weight" => Ok(BlockKind::Weight),
            other => Err(ValidationError::InvalidValue {
                field: "type",
                message: format!("unknown block type '{other}'"),
            }),
        }
    }
}

/// Built-in cards shown for every workout unless hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultCard {
    Time,
    Speed,
    Lap,
    Weight,
}

impl DefaultCard {
    pub const ALL: [DefaultCard; 4] = [
        DefaultCard::Time,
        DefaultCard::Speed,
        DefaultCard::Lap,
        DefaultCard::Weight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultCard::Time => "time",
            DefaultCard::Speed => "speed",
            DefaultCard::Lap => "lap",
            DefaultCard::Weight => "weight",
        }
    }
}

impl fmt::Display for DefaultCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultCard {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DefaultCard::ALL
            .into_iter()
            .find(|card| card.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "hidden_default_blocks",
                message: format!("'{s}' is not a default card"),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSettings {
    pub green_seconds: Option<u32>,
    pub red_seconds: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedSettings {
    pub green_tick_millis: Option<u64>,
    pub red_tick_millis: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapSettings {
    pub green_reps: Option<u32>,
    pub red_reps: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSettings {
    pub loop_seconds: Option<u32>,
    pub loop_tick_millis: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightSettings {
    pub weight_kg: Option<f64>,
}

/// Kind-specific block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockSettings {
    Time(TimeSettings),
    Loop(LoopSettings),
    Speed(SpeedSettings),
    Lap(LapSettings),
    Weight(WeightSettings),
}

fn overwrite<T: Copy>(slot: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *slot = update;
    }
}

fn positive<T: Copy + PartialEq + Default>(
    value: Option<T>,
    field: &'static str,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v == T::default() => Err(ValidationError::NonPositive { field }),
        _ => Ok(()),
    }
}

impl BlockSettings {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockSettings::Time(_) => BlockKind::Time,
            BlockSettings::Loop(_) => BlockKind::Loop,
            BlockSettings::Speed(_) => BlockKind::Speed,
            BlockSettings::Lap(_) => BlockKind::Lap,
            BlockSettings::Weight(_) => BlockKind::Weight,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BlockSettings::Time(t) => {
                positive(t.green_seconds, "green_seconds")?;
                positive(t.red_seconds, "red_seconds")
            }
            BlockSettings::Loop(l) => {
                positive(l.loop_seconds, "loop_seconds")?;
                positive(l.loop_tick_millis, "loop_tick_millis")
            }
            BlockSettings::Speed(s) => {
                positive(s.green_tick_millis, "green_tick_millis")?;
                positive(s.red_tick_millis, "red_tick_millis")
            }
            BlockSettings::Lap(l) => {
                positive(l.green_reps, "green_reps")?;
                positive(l.red_reps, "red_reps")
            }
            BlockSettings::Weight(w) => match w.weight_kg {
                Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::InvalidValue {
                    field: "weight_kg",
                    message: format!("{v} is not a weight"),
                }),
                _ => Ok(()),
            },
        }
    }

    /// Overwrite every field `update` sets. Returns `false`, leaving `self`
    /// untouched, when the kinds differ.
    pub fn merge(&mut self, update: &BlockSettings) -> bool {
        match (self, update) {
            (BlockSettings::Time(cur), BlockSettings::Time(new)) => {
                overwrite(&mut cur.green_seconds, new.green_seconds);
                overwrite(&mut cur.red_seconds, new.red_seconds);
            }
            (BlockSettings::Loop(cur), BlockSettings::Loop(new)) => {
                overwrite(&mut cur.loop_seconds, new.loop_seconds);
                overwrite(&mut cur.loop_tick_millis, new.loop_tick_millis);
            }
            (BlockSettings::Speed(cur), BlockSettings::Speed(new)) => {
                overwrite(&mut cur.green_tick_millis, new.green_tick_millis);
                overwrite(&mut cur.red_tick_millis, new.red_tick_millis);
            }
            (BlockSettings::Lap(cur), BlockSettings::Lap(new)) => {
                overwrite(&mut cur.green_reps, new.green_reps);
                overwrite(&mut cur.red_reps, new.red_reps);
            }
            (BlockSettings::Weight(cur), BlockSettings::Weight(new)) => {
                overwrite(&mut cur.weight_kg, new.weight_kg);
            }
            _ => return false,
        }
        true
    }

    /// Overlay the fields this payload sets onto a configuration.
    ///
    /// Lap counts double as the set/rep targets of a tracked session.
    pub fn apply_to(&self, config: &mut WorkoutConfiguration) {
        match *self {
            BlockSettings::Time(t) => {
                if let Some(v) = t.green_seconds {
                    config.green_seconds = v;
                }
                if let Some(v) = t.red_seconds {
                    config.red_seconds = v;
                }
            }
            BlockSettings::Loop(l) => {
                if let Some(v) = l.loop_seconds {
                    config.infinite_loop_seconds = v;
                }
                if let Some(v) = l.loop_tick_millis {
                    config.infinite_loop_tick_millis = v;
                }
            }
            BlockSettings::Speed(s) => {
                if let Some(v) = s.green_tick_millis {
                    config.green_tick_millis = v;
                }
                if let Some(v) = s.red_tick_millis {
                    config.red_tick_millis = v;
                }
            }
            BlockSettings::Lap(l) => {
                if let Some(v) = l.green_reps {
                    config.green_reps = v;
                    config.target_sets = v;
                }
                if let Some(v) = l.red_reps {
                    config.red_reps = v;
                    config.target_reps = v;
                }
            }
            BlockSettings::Weight(w) => {
                if let Some(v) = w.weight_kg {
                    config.weight_kg = v;
                }
            }
        }
    }
}

/// One block, exclusively owned by the configuration that lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub settings: BlockSettings,
}

impl Block {
    /// Create a block with a freshly generated id.
    pub fn new(settings: BlockSettings, title: Option<String>) -> Self {
        Self {
            id: generate_block_id(),
            title,
            settings,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.settings.kind()
    }
}

/// Millisecond timestamp plus 32 random bits.
pub fn generate_block_id() -> String {
    let salt: u32 = rand::thread_rng().gen();
    format!("{}-{salt:08x}", Utc::now().timestamp_millis())
}
