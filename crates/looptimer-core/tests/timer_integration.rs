//! Integration tests for the Green/Red state machine.
//!
//! Drives `WorkoutTimer` tick by tick: fixed cycles, triple-tracking
//! completion, unbounded loops, pause and epoch invalidation.

use looptimer_core::{
    Event, Phase, SessionDescriptor, SessionMode, WorkoutConfiguration, WorkoutTimer,
};

fn config(green: u32, red: u32) -> WorkoutConfiguration {
    let mut c = WorkoutConfiguration::defaults("w");
    c.green_seconds = green;
    c.red_seconds = red;
    c.green_tick_millis = 1000;
    c.red_tick_millis = 1000;
    c
}

fn tick_n(timer: &mut WorkoutTimer, n: usize) -> Vec<Event> {
    let epoch = timer.epoch();
    let mut events = Vec::new();
    for _ in 0..n {
        events.extend(timer.tick(epoch));
    }
    events
}

#[test]
fn fixed_non_tracking_cycle() {
    let d = SessionDescriptor::build_fixed(&config(2, 1), None, false, None).unwrap();
    let mut timer = WorkoutTimer::new();
    timer.start(d);

    tick_n(&mut timer, 2);
    assert_eq!(timer.phase(), Phase::Red);
    tick_n(&mut timer, 1);
    assert_eq!(timer.phase(), Phase::Green);
    assert_eq!(timer.state().elapsed_total_seconds, 3);

    // Without tracking the pair repeats indefinitely.
    tick_n(&mut timer, 300);
    assert!(timer.phase().is_live());
    assert_eq!(timer.state().current_set, 1);
}

#[test]
fn triple_tracking_terminates() {
    let mut c = config(3, 2);
    c.target_sets = 2;
    c.target_reps = 2;
    let d = SessionDescriptor::build_fixed(&c, Some("Rows"), true, None).unwrap();
    let mut timer = WorkoutTimer::new();
    timer.start(d);

    // Two sets of two reps, each rep one green and one red phase.
    let events = tick_n(&mut timer, 2 * 2 * (3 + 2));
    assert_eq!(timer.phase(), Phase::Completed);

    let reps = events
        .iter()
        .filter(|e| matches!(e, Event::RepCompleted { .. }))
        .count();
    let sets = events
        .iter()
        .filter(|e| matches!(e, Event::SetCompleted { .. }))
        .count();
    assert_eq!((reps, sets), (4, 2));

    let summary = events
        .iter()
        .find_map(|e| match e {
            Event::SessionCompleted { summary, .. } => Some(summary.clone()),
            _ => None,
        })
        .expect("completion event");
    assert_eq!(summary.workout_name, "Rows");
    assert_eq!(summary.elapsed_total_seconds, 20);
    assert_eq!(summary.green_phase_millis, vec![3000; 4]);
    assert_eq!(summary.red_phase_millis, vec![2000; 4]);

    let frozen = timer.state().clone();
    assert!(tick_n(&mut timer, 50).is_empty());
    assert_eq!(timer.state(), &frozen);
}

#[test]
fn infinite_loop_never_completes() {
    let d = SessionDescriptor::build_infinite_loop(&config(30, 15), None, Some(3), Some(100))
        .unwrap();
    assert_eq!(d.mode(), SessionMode::InfiniteLoop);
    let mut timer = WorkoutTimer::new();
    timer.start(d);

    let epoch = timer.epoch();
    for _ in 0..10_000 {
        timer.tick(epoch);
        assert!(matches!(timer.phase(), Phase::Green | Phase::Red));
    }
    let s = timer.state();
    assert_eq!(s.elapsed_total_seconds, 10_000);
    assert_eq!(s.elapsed_millis, 1_000_000);
    assert!(!s.is_recovery_subphase);
}

#[test]
fn pause_freezes_progress() {
    let d = SessionDescriptor::build_fixed(&config(10, 5), None, true, None).unwrap();
    let mut timer = WorkoutTimer::new();
    timer.start(d);
    tick_n(&mut timer, 4);

    timer.pause();
    let before = timer.state().clone();
    tick_n(&mut timer, 25);
    assert_eq!(timer.state(), &before);

    timer.resume();
    assert_eq!(timer.state().remaining_seconds, 6);
    tick_n(&mut timer, 1);
    assert_eq!(timer.state().remaining_seconds, 5);
    assert_eq!(timer.state().elapsed_total_seconds, 5);
}

#[test]
fn new_start_invalidates_old_epoch() {
    let mut timer = WorkoutTimer::new();
    timer.start(SessionDescriptor::build_fixed(&config(10, 10), None, false, None).unwrap());
    let old_epoch = timer.epoch();
    tick_n(&mut timer, 3);
    timer.pause();

    let events =
        timer.start(SessionDescriptor::build_fixed(&config(4, 4), None, false, None).unwrap());
    assert!(matches!(events[0], Event::SessionStopped { .. }));
    assert!(matches!(events[1], Event::SessionStarted { .. }));
    assert_eq!(timer.epoch(), old_epoch + 1);

    let fresh = timer.state().clone();
    assert_eq!(fresh.elapsed_total_seconds, 0);
    assert!(!fresh.paused);
    assert!(timer.tick(old_epoch).is_empty());
    assert_eq!(timer.state(), &fresh);

    timer.tick(timer.epoch());
    assert_eq!(timer.state().remaining_seconds, 3);
}

#[test]
fn stop_keeps_accumulators_until_next_start() {
    let mut timer = WorkoutTimer::new();
    timer.start(SessionDescriptor::build_fixed(&config(2, 2), None, false, None).unwrap());
    tick_n(&mut timer, 3);
    timer.stop();
    assert_eq!(timer.phase(), Phase::Idle);
    assert_eq!(timer.state().elapsed_green_seconds, 2);
    assert_eq!(timer.state().elapsed_red_seconds, 1);

    timer.start(SessionDescriptor::build_fixed(&config(2, 2), None, false, None).unwrap());
    assert_eq!(timer.state().elapsed_total_seconds, 0);
}
