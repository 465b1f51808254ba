//! Completed-workout summaries and their history log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::SettingsStore;
use crate::timer::{Phase, PhaseSpan, RunState, SessionDescriptor, SessionMode};

/// Storage key of the summary history.
pub const SUMMARIES_KEY: &str = "workoutSummaries";

/// Outcome of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub id: Uuid,
    /// Completion time.
    pub date: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub workout_id: String,
    pub workout_name: String,
    pub mode: SessionMode,
    pub completed_sets: u32,
    /// Reps per set.
    pub completed_reps: u32,
    pub elapsed_total_seconds: u64,
    pub elapsed_green_seconds: u64,
    pub elapsed_red_seconds: u64,
    pub elapsed_millis: u64,
    pub weight_kg: f64,
    /// sets x reps x weight.
    pub total_volume_kg: f64,
    pub green_phase_millis: Vec<u64>,
    pub red_phase_millis: Vec<u64>,
    pub average_green_millis: f64,
    pub average_red_millis: f64,
}

impl WorkoutSummary {
    pub fn from_run(
        descriptor: &SessionDescriptor,
        state: &RunState,
        phase_log: &[PhaseSpan],
        started_at: DateTime<Utc>,
    ) -> Self {
        let spans = |phase: Phase| -> Vec<u64> {
            phase_log
                .iter()
                .filter(|s| s.phase == phase)
                .map(|s| s.millis)
                .collect()
        };
        let green = spans(Phase::Green);
        let red = spans(Phase::Red);
        let weight = descriptor.weight_kg();
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            started_at,
            workout_id: descriptor.workout_id().to_string(),
            workout_name: descriptor.workout_name().to_string(),
            mode: descriptor.mode(),
            completed_sets: state.current_set,
            completed_reps: state.current_rep,
            elapsed_total_seconds: state.elapsed_total_seconds,
            elapsed_green_seconds: state.elapsed_green_seconds,
            elapsed_red_seconds: state.elapsed_red_seconds,
            elapsed_millis: state.elapsed_millis,
            weight_kg: weight,
            total_volume_kg: f64::from(state.current_set) * f64::from(state.current_rep) * weight,
            average_green_millis: average(&green),
            average_red_millis: average(&red),
            green_phase_millis: green,
            red_phase_millis: red,
        }
    }
}

fn average(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Bounded history of summaries, oldest first.
#[derive(Clone)]
pub struct SummaryLog {
    store: SettingsStore,
    limit: usize,
}

impl SummaryLog {
    pub fn new(store: SettingsStore, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// All stored summaries. An unreadable history reads as empty.
    pub async fn list(&self) -> Result<Vec<WorkoutSummary>, StorageError> {
        let Some(raw) = self.store.backend().get(SUMMARIES_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable summary history");
                Ok(Vec::new())
            }
        }
    }

    pub async fn for_workout(&self, workout_id: &str) -> Result<Vec<WorkoutSummary>, StorageError> {
        let mut list = self.list().await?;
        list.retain(|s| s.workout_id == workout_id);
        Ok(list)
    }

    /// Append, dropping the oldest entries beyond the limit, and mark the
    /// workout as last active.
    pub async fn append(&self, summary: &WorkoutSummary) -> Result<(), StorageError> {
        let mut list = self.list().await?;
        list.push(summary.clone());
        if list.len() > self.limit {
            let excess = list.len() - self.limit;
            list.drain(..excess);
        }
        let json =
            serde_json::to_string(&list).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.backend().set(SUMMARIES_KEY, &json).await?;
        self.store
            .set_last_active_workout_id(&summary.workout_id)
            .await?;
        tracing::info!(
            workout_id = %summary.workout_id,
            volume = summary.total_volume_kg,
            stored = list.len(),
            "recorded workout summary"
        );
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.backend().remove(SUMMARIES_KEY).await
    }
}
