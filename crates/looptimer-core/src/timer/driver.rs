//! Tick driver: one tokio task that owns a [`WorkoutTimer`].
//!
//! Commands arrive over an mpsc channel and are answered on oneshot
//! channels. After every mutation the driver publishes the [`RunState`] on a
//! `watch` channel and fans events out on a `broadcast` channel.
//!
//! The next tick is armed one pace interval after the previous tick (or after
//! start/resume) and is tagged with the epoch that armed it. A late wake-up
//! delivers a single tick; missed intervals are never replayed.

use std::future;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Duration, Instant};

use super::descriptor::SessionDescriptor;
use super::engine::{RunState, WorkoutTimer};
use crate::error::CoreError;
use crate::events::Event;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 256;

enum Command {
    Start {
        descriptor: SessionDescriptor,
        reply: oneshot::Sender<u64>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Event>,
    },
}

/// Cloneable handle to a running tick driver.
///
/// The driver task ends when the last handle is dropped.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<RunState>,
    events: broadcast::Sender<Event>,
}

/// Spawn the driver task. Must be called inside a tokio runtime.
pub fn spawn_driver() -> TimerHandle {
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let (state_tx, state) = watch::channel(RunState::default());
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    tokio::spawn(run_driver(WorkoutTimer::new(), rx, state_tx, events.clone()));
    TimerHandle {
        commands,
        state,
        events,
    }
}

impl TimerHandle {
    /// Start a new run; returns its epoch. Any live run is stopped first.
    pub async fn start(&self, descriptor: SessionDescriptor) -> Result<u64, CoreError> {
        self.request(|reply| Command::Start { descriptor, reply })
            .await
    }

    /// Returns `false` when there was nothing to pause.
    pub async fn pause(&self) -> Result<bool, CoreError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<bool, CoreError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    pub async fn stop(&self) -> Result<bool, CoreError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Snapshot event including session progress.
    pub async fn snapshot_event(&self) -> Result<Event, CoreError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> RunState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every published state.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| CoreError::TimerClosed)?;
        rx.await.map_err(|_| CoreError::TimerClosed)
    }
}

/// Pending tick: the epoch that armed it and when it fires.
type Deadline = Option<(u64, Instant)>;

fn arm(timer: &WorkoutTimer) -> Deadline {
    if !timer.is_running() {
        return None;
    }
    let pace = timer.tick_millis()?;
    Some((timer.epoch(), Instant::now() + Duration::from_millis(pace)))
}

async fn wait_for(deadline: Deadline) {
    match deadline {
        Some((_, at)) => time::sleep_until(at).await,
        None => future::pending().await,
    }
}

fn publish(
    timer: &WorkoutTimer,
    state: &watch::Sender<RunState>,
    events: &broadcast::Sender<Event>,
    emitted: Vec<Event>,
) {
    state.send_replace(timer.state().clone());
    for event in emitted {
        let _ = events.send(event);
    }
}

async fn run_driver(
    mut timer: WorkoutTimer,
    mut commands: mpsc::Receiver<Command>,
    state: watch::Sender<RunState>,
    events: broadcast::Sender<Event>,
) {
    let mut deadline: Deadline = None;
    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                // State is published before the reply so callers observe it.
                match cmd {
                    Command::Start { descriptor, reply } => {
                        let emitted = timer.start(descriptor);
                        deadline = arm(&timer);
                        publish(&timer, &state, &events, emitted);
                        let _ = reply.send(timer.epoch());
                    }
                    Command::Pause { reply } => {
                        let emitted: Vec<Event> = timer.pause().into_iter().collect();
                        let changed = !emitted.is_empty();
                        if changed {
                            deadline = None;
                        }
                        publish(&timer, &state, &events, emitted);
                        let _ = reply.send(changed);
                    }
                    Command::Resume { reply } => {
                        let emitted: Vec<Event> = timer.resume().into_iter().collect();
                        let changed = !emitted.is_empty();
                        if changed {
                            deadline = arm(&timer);
                        }
                        publish(&timer, &state, &events, emitted);
                        let _ = reply.send(changed);
                    }
                    Command::Stop { reply } => {
                        let emitted: Vec<Event> = timer.stop().into_iter().collect();
                        let changed = !emitted.is_empty();
                        deadline = None;
                        publish(&timer, &state, &events, emitted);
                        let _ = reply.send(changed);
                    }
                    Command::Snapshot { reply } => {
                        let _ = reply.send(timer.snapshot());
                    }
                }
            }
            _ = wait_for(deadline) => {
                if let Some((epoch, _)) = deadline.take() {
                    let emitted = timer.tick(epoch);
                    deadline = arm(&timer);
                    publish(&timer, &state, &events, emitted);
                }
            }
        }
    }
    tracing::debug!("timer driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WorkoutConfiguration;
    use crate::timer::Phase;

    fn descriptor(green: u32, red: u32, tracking: Option<(u32, u32)>) -> SessionDescriptor {
        let mut c = WorkoutConfiguration::defaults("w");
        c.green_seconds = green;
        c.red_seconds = red;
        if let Some((sets, reps)) = tracking {
            c.target_sets = sets;
            c.target_reps = reps;
        }
        SessionDescriptor::build_fixed(&c, None, tracking.is_some(), None).unwrap()
    }

    async fn advance_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_the_pace() {
        let handle = spawn_driver();
        assert_eq!(handle.start(descriptor(2, 1, None)).await.unwrap(), 1);
        assert_eq!(handle.snapshot().phase, Phase::Green);

        advance_ms(2_100).await;
        assert_eq!(handle.snapshot().phase, Phase::Red);

        advance_ms(1_000).await;
        let s = handle.snapshot();
        assert_eq!(s.phase, Phase::Green);
        assert_eq!(s.elapsed_total_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_the_count() {
        let handle = spawn_driver();
        handle.start(descriptor(10, 10, None)).await.unwrap();
        advance_ms(3_500).await;
        assert!(handle.pause().await.unwrap());
        let paused = handle.snapshot();
        assert_eq!(paused.remaining_seconds, 7);

        advance_ms(60_000).await;
        assert_eq!(handle.snapshot(), paused);

        assert!(handle.resume().await.unwrap());
        advance_ms(1_100).await;
        assert_eq!(handle.snapshot().remaining_seconds, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_bumps_epoch() {
        let handle = spawn_driver();
        let mut events = handle.events();
        handle.start(descriptor(5, 5, None)).await.unwrap();
        handle.pause().await.unwrap();
        assert_eq!(handle.start(descriptor(3, 3, None)).await.unwrap(), 2);

        advance_ms(1_100).await;
        let s = handle.snapshot();
        assert_eq!(s.epoch, 2);
        assert_eq!(s.remaining_seconds, 2);

        let mut epochs = Vec::new();
        while let Ok(e) = events.try_recv() {
            epochs.push(e.epoch());
        }
        assert_eq!(epochs, vec![1, 1, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn tracked_session_completes_and_stops_ticking() {
        let handle = spawn_driver();
        let mut events = handle.events();
        handle.start(descriptor(1, 1, Some((1, 2)))).await.unwrap();

        advance_ms(10_000).await;
        let s = handle.snapshot();
        assert_eq!(s.phase, Phase::Completed);
        assert_eq!(s.elapsed_total_seconds, 4);

        let mut completed = false;
        while let Ok(e) = events.try_recv() {
            if let Event::SessionCompleted { summary, .. } = e {
                assert_eq!(summary.completed_reps, 2);
                completed = true;
            }
        }
        assert!(completed);
        assert!(!handle.pause().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_to_idle() {
        let handle = spawn_driver();
        handle.start(descriptor(5, 5, None)).await.unwrap();
        advance_ms(2_100).await;
        assert!(handle.stop().await.unwrap());
        advance_ms(5_000).await;
        let s = handle.snapshot();
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.elapsed_total_seconds, 2);
        assert!(!handle.stop().await.unwrap());
    }

    #[tokio::test]
    async fn snapshot_event_reports_progress() {
        let handle = spawn_driver();
        match handle.snapshot_event().await.unwrap() {
            Event::StateSnapshot { progress, .. } => assert_eq!(progress, 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }
}
