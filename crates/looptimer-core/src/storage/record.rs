//! Persisted settings record.
//!
//! The on-disk shape predates the typed model: durations and weight are
//! decimal strings, paces are integer milliseconds, and older records may
//! carry numbers where strings are expected (or the reverse). Decoding is
//! per field and never fails; anything unusable falls back to the default.

use serde_json::{json, Map, Value};

use crate::error::StorageError;
use crate::settings::{
    Block, BlockKind, BlockSettings, DefaultCard, LapSettings, LoopSettings, SpeedSettings,
    TimeSettings, WeightSettings, WorkoutConfiguration,
};

const WORKOUT_ID: &str = "workoutId";
const GREEN_TIME: &str = "greenTime";
const REST_TIME: &str = "restTime";
const GREEN_REPS: &str = "greenReps";
const RED_REPS: &str = "redReps";
const GREEN_SPEED: &str = "greenCountdownSpeed";
const RED_SPEED: &str = "redCountdownSpeed";
const LOOP_TIME: &str = "infiniteLoopTime";
const LOOP_SPEED: &str = "infiniteSpeed";
const TARGET_SETS: &str = "targetSets";
const TARGET_REPS: &str = "targetReps";
const WEIGHT: &str = "weight";
const CUSTOM_BLOCKS: &str = "customBlocks";
const HIDDEN_CARDS: &str = "hiddenCards";

/// Raw settings record as stored under one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRecord {
    fields: Map<String, Value>,
}

impl StoredRecord {
    /// Decode stored JSON. Anything but a JSON object yields an empty record.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Self { fields },
            Ok(_) | Err(_) => {
                tracing::warn!("discarding malformed settings record");
                Self::default()
            }
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn workout_id(&self) -> Option<&str> {
        self.fields.get(WORKOUT_ID).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.fields).map_err(|e| StorageError::Encode(e.to_string()))
    }

    /// Encode a configuration in the persisted shape.
    pub fn encode(config: &WorkoutConfiguration) -> Self {
        let mut fields = Map::new();
        fields.insert(WORKOUT_ID.into(), json!(config.workout_id));
        fields.insert(GREEN_TIME.into(), json!(config.green_seconds.to_string()));
        fields.insert(REST_TIME.into(), json!(config.red_seconds.to_string()));
        fields.insert(GREEN_REPS.into(), json!(config.green_reps.to_string()));
        fields.insert(RED_REPS.into(), json!(config.red_reps.to_string()));
        fields.insert(GREEN_SPEED.into(), json!(config.green_tick_millis));
        fields.insert(RED_SPEED.into(), json!(config.red_tick_millis));
        fields.insert(
            LOOP_TIME.into(),
            json!(config.infinite_loop_seconds.to_string()),
        );
        fields.insert(LOOP_SPEED.into(), json!(config.infinite_loop_tick_millis));
        fields.insert(TARGET_SETS.into(), json!(config.target_sets.to_string()));
        fields.insert(TARGET_REPS.into(), json!(config.target_reps.to_string()));
        fields.insert(WEIGHT.into(), json!(config.weight_kg.to_string()));
        fields.insert(
            CUSTOM_BLOCKS.into(),
            Value::Array(config.custom_blocks.iter().map(encode_block).collect()),
        );
        fields.insert(
            HIDDEN_CARDS.into(),
            Value::Array(
                config
                    .hidden_default_blocks
                    .iter()
                    .map(|card| json!(card.as_str()))
                    .collect(),
            ),
        );
        Self { fields }
    }

    /// Merge this record over the defaults, stamping `workout_id`.
    pub fn resolve(&self, workout_id: &str) -> WorkoutConfiguration {
        let mut config = WorkoutConfiguration::defaults(workout_id);
        let f = &self.fields;

        if let Some(v) = read_count(f.get(GREEN_TIME)) {
            config.green_seconds = v;
        }
        if let Some(v) = read_count(f.get(REST_TIME)) {
            config.red_seconds = v;
        }
        if let Some(v) = read_count(f.get(GREEN_REPS)) {
            config.green_reps = v;
        }
        if let Some(v) = read_count(f.get(RED_REPS)) {
            config.red_reps = v;
        }
        if let Some(v) = read_millis(f.get(GREEN_SPEED)) {
            config.green_tick_millis = v;
        }
        if let Some(v) = read_millis(f.get(RED_SPEED)) {
            config.red_tick_millis = v;
        }
        if let Some(v) = read_count(f.get(LOOP_TIME)) {
            config.infinite_loop_seconds = v;
        }
        if let Some(v) = read_millis(f.get(LOOP_SPEED)) {
            config.infinite_loop_tick_millis = v;
        }
        if let Some(v) = read_count(f.get(TARGET_SETS)) {
            config.target_sets = v;
        }
        if let Some(v) = read_count(f.get(TARGET_REPS)) {
            config.target_reps = v;
        }
        if let Some(v) = read_weight(f.get(WEIGHT)) {
            config.weight_kg = v;
        }
        if let Some(Value::Array(items)) = f.get(CUSTOM_BLOCKS) {
            config.custom_blocks = items.iter().filter_map(decode_block).collect();
        }
        if let Some(Value::Array(items)) = f.get(HIDDEN_CARDS) {
            for card in items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|s| s.parse::<DefaultCard>().ok())
            {
                config.hide(card);
            }
        }
        config
    }
}

fn read_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Whole count of at least one.
fn read_count(value: Option<&Value>) -> Option<u32> {
    let n = read_number(value?)?.trunc();
    (n >= 1.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}

/// Tick pace of at least one millisecond.
fn read_millis(value: Option<&Value>) -> Option<u64> {
    let n = read_number(value?)?.round();
    (n >= 1.0 && n <= u64::MAX as f64).then_some(n as u64)
}

fn read_weight(value: Option<&Value>) -> Option<f64> {
    read_number(value?).filter(|w| *w >= 0.0)
}

fn encode_block(block: &Block) -> Value {
    let mut settings = Map::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            settings.insert(key.to_string(), value);
        }
    };
    match block.settings {
        BlockSettings::Time(t) => {
            put(GREEN_TIME, t.green_seconds.map(|v| json!(v.to_string())));
            put(REST_TIME, t.red_seconds.map(|v| json!(v.to_string())));
        }
        BlockSettings::Speed(s) => {
            put(GREEN_SPEED, s.green_tick_millis.map(|v| json!(v)));
            put(RED_SPEED, s.red_tick_millis.map(|v| json!(v)));
        }
        BlockSettings::Lap(l) => {
            put(GREEN_REPS, l.green_reps.map(|v| json!(v)));
            put(RED_REPS, l.red_reps.map(|v| json!(v)));
        }
        BlockSettings::Loop(l) => {
            put(LOOP_TIME, l.loop_seconds.map(|v| json!(v.to_string())));
            put(LOOP_SPEED, l.loop_tick_millis.map(|v| json!(v)));
        }
        BlockSettings::Weight(w) => {
            put(WEIGHT, w.weight_kg.map(|v| json!(v.to_string())));
        }
    }

    let mut out = Map::new();
    out.insert("id".into(), json!(block.id));
    out.insert("type".into(), json!(block.kind().as_str()));
    out.insert("settings".into(), Value::Object(settings));
    if let Some(title) = &block.title {
        out.insert("title".into(), json!(title));
    }
    Value::Object(out)
}

fn decode_block(value: &Value) -> Option<Block> {
    let obj = value.as_object()?;
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            tracing::warn!("dropping stored block without an id");
            return None;
        }
    };
    let kind = match obj.get("type").and_then(Value::as_str).map(str::parse::<BlockKind>) {
        Some(Ok(kind)) => kind,
        _ => {
            tracing::warn!(block_id = %id, "dropping stored block of unknown type");
            return None;
        }
    };
    let empty = Map::new();
    let s = obj
        .get("settings")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let settings = match kind {
        BlockKind::Time => BlockSettings::Time(TimeSettings {
            green_seconds: read_count(s.get(GREEN_TIME)),
            red_seconds: read_count(s.get(REST_TIME)),
        }),
        BlockKind::Speed => BlockSettings::Speed(SpeedSettings {
            green_tick_millis: read_millis(s.get(GREEN_SPEED)),
            red_tick_millis: read_millis(s.get(RED_SPEED)),
        }),
        BlockKind::Lap => BlockSettings::Lap(LapSettings {
            green_reps: read_count(s.get(GREEN_REPS)),
            red_reps: read_count(s.get(RED_REPS)),
        }),
        BlockKind::Loop => BlockSettings::Loop(LoopSettings {
            loop_seconds: read_count(s.get(LOOP_TIME)),
            loop_tick_millis: read_millis(s.get(LOOP_SPEED)),
        }),
        BlockKind::Weight => BlockSettings::Weight(WeightSettings {
            weight_kg: read_weight(s.get(WEIGHT)),
        }),
    };

    Some(Block {
        id,
        title: obj.get("title").and_then(Value::as_str).map(str::to_string),
        settings,
    })
}
