//! Per-workout configuration record.

use serde::{Deserialize, Serialize};

use super::block::{Block, DefaultCard};
use crate::error::ValidationError;

/// Workout id of the global quick-start configuration.
pub const DEFAULT_WORKOUT_ID: &str = "default";

pub const DEFAULT_GREEN_SECONDS: u32 = 30;
pub const DEFAULT_RED_SECONDS: u32 = 30;
pub const DEFAULT_GREEN_REPS: u32 = 3;
pub const DEFAULT_RED_REPS: u32 = 3;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;
pub const DEFAULT_LOOP_SECONDS: u32 = 30;
pub const DEFAULT_TARGET_SETS: u32 = 3;
pub const DEFAULT_TARGET_REPS: u32 = 6;
pub const DEFAULT_WEIGHT_KG: f64 = 75.0;

/// Fully resolved configuration of one workout.
///
/// Values handed out by the resolver are always complete: durations, paces
/// and targets are at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutConfiguration {
    pub workout_id: String,
    /// Green phase length in fixed mode.
    pub green_seconds: u32,
    /// Red phase length in fixed mode.
    pub red_seconds: u32,
    /// Legacy rep counters, kept so older records round-trip.
    pub green_reps: u32,
    pub red_reps: u32,
    /// Milliseconds per countdown unit while green.
    pub green_tick_millis: u64,
    /// Milliseconds per countdown unit while red.
    pub red_tick_millis: u64,
    pub infinite_loop_seconds: u32,
    pub infinite_loop_tick_millis: u64,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight_kg: f64,
    /// Most recently touched block first.
    pub custom_blocks: Vec<Block>,
    /// Built-in cards the user removed; insertion ordered, no duplicates.
    pub hidden_default_blocks: Vec<DefaultCard>,
}

impl WorkoutConfiguration {
    /// Hard-coded defaults stamped with `workout_id`.
    pub fn defaults(workout_id: impl Into<String>) -> Self {
        Self {
            workout_id: workout_id.into(),
            green_seconds: DEFAULT_GREEN_SECONDS,
            red_seconds: DEFAULT_RED_SECONDS,
            green_reps: DEFAULT_GREEN_REPS,
            red_reps: DEFAULT_RED_REPS,
            green_tick_millis: DEFAULT_TICK_MILLIS,
            red_tick_millis: DEFAULT_TICK_MILLIS,
            infinite_loop_seconds: DEFAULT_LOOP_SECONDS,
            infinite_loop_tick_millis: DEFAULT_TICK_MILLIS,
            target_sets: DEFAULT_TARGET_SETS,
            target_reps: DEFAULT_TARGET_REPS,
            weight_kg: DEFAULT_WEIGHT_KG,
            custom_blocks: Vec::new(),
            hidden_default_blocks: Vec::new(),
        }
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.custom_blocks.iter().find(|b| b.id == block_id)
    }

    pub fn is_hidden(&self, card: DefaultCard) -> bool {
        self.hidden_default_blocks.contains(&card)
    }

    /// Built-in cards that should still be shown, in display order.
    pub fn visible_default_cards(&self) -> Vec<DefaultCard> {
        DefaultCard::ALL
            .into_iter()
            .filter(|card| !self.is_hidden(*card))
            .collect()
    }

    /// Returns `false` when the card was already hidden.
    pub(crate) fn hide(&mut self, card: DefaultCard) -> bool {
        if self.is_hidden(card) {
            return false;
        }
        self.hidden_default_blocks.push(card);
        true
    }

    /// Remove `block_id` and put `block` at the front.
    pub(crate) fn move_to_front(&mut self, block: Block) {
        self.custom_blocks.retain(|b| b.id != block.id);
        self.custom_blocks.insert(0, block);
    }
}

/// A single field-level setter, as issued by settings screens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    GreenSeconds(u32),
    RedSeconds(u32),
    GreenReps(u32),
    RedReps(u32),
    GreenTickMillis(u64),
    RedTickMillis(u64),
    InfiniteLoopSeconds(u32),
    InfiniteLoopTickMillis(u64),
    TargetSets(u32),
    TargetReps(u32),
    WeightKg(f64),
}

impl FieldEdit {
    pub fn field(&self) -> &'static str {
        match self {
            FieldEdit::GreenSeconds(_) => "green_seconds",
            FieldEdit::RedSeconds(_) => "red_seconds",
            FieldEdit::GreenReps(_) => "green_reps",
            FieldEdit::RedReps(_) => "red_reps",
            FieldEdit::GreenTickMillis(_) => "green_tick_millis",
            FieldEdit::RedTickMillis(_) => "red_tick_millis",
            FieldEdit::InfiniteLoopSeconds(_) => "infinite_loop_seconds",
            FieldEdit::InfiniteLoopTickMillis(_) => "infinite_loop_tick_millis",
            FieldEdit::TargetSets(_) => "target_sets",
            FieldEdit::TargetReps(_) => "target_reps",
            FieldEdit::WeightKg(_) => "weight_kg",
        }
    }

    /// Reject values that would break the resolved-configuration invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let field = self.field();
        match *self {
            FieldEdit::GreenSeconds(v)
            | FieldEdit::RedSeconds(v)
            | FieldEdit::GreenReps(v)
            | FieldEdit::RedReps(v)
            | FieldEdit::InfiniteLoopSeconds(v)
            | FieldEdit::TargetSets(v)
            | FieldEdit::TargetReps(v) => {
                if v == 0 {
                    return Err(ValidationError::NonPositive { field });
                }
            }
            FieldEdit::GreenTickMillis(v)
            | FieldEdit::RedTickMillis(v)
            | FieldEdit::InfiniteLoopTickMillis(v) => {
                if v == 0 {
                    return Err(ValidationError::NonPositive { field });
                }
            }
            FieldEdit::WeightKg(v) => {
                if !v.is_finite() || v < 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field,
                        message: format!("{v} is not a weight"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn apply(&self, config: &mut WorkoutConfiguration) {
        match *self {
            FieldEdit::GreenSeconds(v) => config.green_seconds = v,
            FieldEdit::RedSeconds(v) => config.red_seconds = v,
            FieldEdit::GreenReps(v) => config.green_reps = v,
            FieldEdit::RedReps(v) => config.red_reps = v,
            FieldEdit::GreenTickMillis(v) => config.green_tick_millis = v,
            FieldEdit::RedTickMillis(v) => config.red_tick_millis = v,
            FieldEdit::InfiniteLoopSeconds(v) => config.infinite_loop_seconds = v,
            FieldEdit::InfiniteLoopTickMillis(v) => config.infinite_loop_tick_millis = v,
            FieldEdit::TargetSets(v) => config.target_sets = v,
            FieldEdit::TargetReps(v) => config.target_reps = v,
            FieldEdit::WeightKg(v) => config.weight_kg = v,
        }
    }
}
