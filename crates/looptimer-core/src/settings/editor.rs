//! Field-level settings editing with background persistence.
//!
//! Setters change the in-memory copy at once and queue the edit; a single
//! worker task persists queued edits in order. Failures come back on the
//! channel returned by [`SettingsEditor::open`].

use tokio::sync::{mpsc, oneshot};

use super::model::{FieldEdit, WorkoutConfiguration};
use super::resolver::SettingsResolver;
use crate::error::{CoreError, ValidationError};
use crate::timer::seconds_to_millis;

/// A batch of edits that could not be written.
#[derive(Debug)]
pub struct PersistFailure {
    pub workout_id: String,
    pub edits: Vec<FieldEdit>,
    pub error: CoreError,
}

enum Job {
    Apply(Vec<FieldEdit>),
    Flush(oneshot::Sender<()>),
}

pub struct SettingsEditor {
    workout_id: String,
    config: WorkoutConfiguration,
    resolver: SettingsResolver,
    jobs: mpsc::UnboundedSender<Job>,
}

impl SettingsEditor {
    /// Resolve `workout_id` and start its persistence worker.
    ///
    /// Must be called inside a tokio runtime. The worker exits once the
    /// editor is dropped and its queue is drained.
    pub async fn open(
        resolver: SettingsResolver,
        workout_id: &str,
    ) -> (Self, mpsc::UnboundedReceiver<PersistFailure>) {
        let config = resolver.resolve(workout_id).await;
        let (jobs, rx) = mpsc::unbounded_channel();
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        tokio::spawn(persist_worker(
            resolver.clone(),
            workout_id.to_string(),
            rx,
            failures_tx,
        ));
        let editor = Self {
            workout_id: workout_id.to_string(),
            config,
            resolver,
            jobs,
        };
        (editor, failures_rx)
    }

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    /// The in-memory configuration, including edits not yet persisted.
    pub fn config(&self) -> &WorkoutConfiguration {
        &self.config
    }

    /// Validate and apply a batch. Nothing is applied if any edit is invalid.
    pub fn apply(&mut self, edits: Vec<FieldEdit>) -> Result<(), ValidationError> {
        for edit in &edits {
            edit.validate()?;
        }
        for edit in &edits {
            edit.apply(&mut self.config);
        }
        if self.jobs.send(Job::Apply(edits)).is_err() {
            tracing::warn!(workout_id = %self.workout_id, "persistence worker gone, edit kept in memory only");
        }
        Ok(())
    }

    pub fn set_green_seconds(&mut self, seconds: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::GreenSeconds(seconds)])
    }

    pub fn set_red_seconds(&mut self, seconds: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::RedSeconds(seconds)])
    }

    pub fn set_green_reps(&mut self, reps: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::GreenReps(reps)])
    }

    pub fn set_red_reps(&mut self, reps: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::RedReps(reps)])
    }

    pub fn set_green_tick_millis(&mut self, millis: u64) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::GreenTickMillis(millis)])
    }

    pub fn set_red_tick_millis(&mut self, millis: u64) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::RedTickMillis(millis)])
    }

    /// Green pace as shown on screen, in seconds per unit.
    pub fn set_green_pace_seconds(&mut self, seconds: f64) -> Result<(), ValidationError> {
        let millis = seconds_to_millis(seconds)?;
        self.set_green_tick_millis(millis)
    }

    pub fn set_red_pace_seconds(&mut self, seconds: f64) -> Result<(), ValidationError> {
        let millis = seconds_to_millis(seconds)?;
        self.set_red_tick_millis(millis)
    }

    pub fn set_infinite_loop_seconds(&mut self, seconds: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::InfiniteLoopSeconds(seconds)])
    }

    pub fn set_infinite_loop_tick_millis(&mut self, millis: u64) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::InfiniteLoopTickMillis(millis)])
    }

    pub fn set_target_sets(&mut self, sets: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::TargetSets(sets)])
    }

    pub fn set_target_reps(&mut self, reps: u32) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::TargetReps(reps)])
    }

    pub fn set_weight_kg(&mut self, weight: f64) -> Result<(), ValidationError> {
        self.apply(vec![FieldEdit::WeightKg(weight)])
    }

    /// Wait until every edit queued so far has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.jobs.send(Job::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Flush, then reload the configuration from storage.
    pub async fn refresh(&mut self) -> &WorkoutConfiguration {
        self.flush().await;
        self.config = self.resolver.resolve(&self.workout_id).await;
        &self.config
    }
}

async fn persist_worker(
    resolver: SettingsResolver,
    workout_id: String,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    failures: mpsc::UnboundedSender<PersistFailure>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            Job::Apply(edits) => {
                let result = resolver
                    .modify(&workout_id, |config| {
                        for edit in &edits {
                            edit.apply(config);
                        }
                        Ok(())
                    })
                    .await;
                if let Err(error) = result {
                    tracing::warn!(workout_id = %workout_id, error = %error, "failed to persist settings edit");
                    // Receiver may already be dropped.
                    let _ = failures.send(PersistFailure {
                        workout_id: workout_id.clone(),
                        edits,
                        error,
                    });
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!(workout_id = %workout_id, "settings editor closed");
}
