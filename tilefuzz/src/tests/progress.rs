use crate::budget::Budget;
use crate::progress::{ProgressTracker, RunState};
use std::time::Duration;

#[test]
fn test_idle_tracker() {
    let tracker = ProgressTracker::new(Budget::iterations(10));
    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.state, RunState::Idle);
    assert_eq!(snapshot.fraction, 0.0);
    assert_eq!(snapshot.elapsed, Duration::ZERO);
    assert!(snapshot.mutations.is_none());
}

#[test]
fn test_iteration_fraction_while_running() {
    let tracker = ProgressTracker::new(Budget::iterations(10));
    tracker.begin(None);
    assert_eq!(tracker.next_iteration(), 1);
    assert_eq!(tracker.next_iteration(), 2);
    assert_eq!(tracker.next_iteration(), 3);

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.state, RunState::Running);
    assert!((snapshot.fraction - 0.3).abs() < 1e-9);
    assert!(snapshot.to_string().contains(" -- Iteration: 3/10"));
    assert!(!tracker.is_budget_exhausted());
}

#[test]
fn test_budget_exhaustion() {
    let tracker = ProgressTracker::new(Budget::iterations(2));
    tracker.begin(None);
    tracker.next_iteration();
    assert!(!tracker.is_budget_exhausted());
    tracker.next_iteration();
    assert!(tracker.is_budget_exhausted());
}

#[test]
fn test_mutation_progress() {
    let tracker = ProgressTracker::new(Budget::iterations(100));
    tracker.begin(Some(40));
    tracker.set_visited(20);

    let snapshot = tracker.snapshot();
    let mutations = snapshot.mutations.unwrap();
    assert_eq!(mutations.visited, 20);
    assert_eq!(mutations.estimated_total, 40);
    assert!((snapshot.fraction - 0.5).abs() < 1e-9);
    assert!(snapshot.to_string().starts_with(" -- Mutations: 20/40"));
}

#[test]
fn test_finish_freezes_clock() {
    let tracker = ProgressTracker::new(Budget::seconds(60));
    tracker.begin(None);
    tracker.finish();

    let first = tracker.elapsed();
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(tracker.elapsed(), first);

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.state, RunState::Finished);
    assert_eq!(snapshot.fraction, 1.0);
    assert!(snapshot.to_string().contains("/60 seconds"));
}

#[test]
fn test_begin_resets_counters() {
    let tracker = ProgressTracker::new(Budget::unbounded());
    tracker.begin(Some(10));
    tracker.next_iteration();
    tracker.set_visited(2);
    tracker.finish();

    tracker.begin(None);
    assert_eq!(tracker.iterations(), 0);
    assert_eq!(tracker.state(), RunState::Running);
    assert!(tracker.snapshot().mutations.is_none());
    assert_eq!(tracker.snapshot().fraction, 0.0);
}

#[test]
fn test_budget_fraction_takes_larger_bound() {
    let budget = Budget {
        max_iterations: Some(10),
        max_time_secs: Some(10),
    };
    assert!((budget.fraction(2, Duration::from_secs(5)) - 0.5).abs() < 1e-9);
    assert!((budget.fraction(8, Duration::from_secs(5)) - 0.8).abs() < 1e-9);
    assert_eq!(Budget::unbounded().fraction(1_000, Duration::from_secs(1)), 0.0);
}

#[test]
fn test_budget_either_bound_exhausts() {
    let budget = Budget {
        max_iterations: Some(10),
        max_time_secs: Some(1),
    };
    assert!(!budget.is_exhausted(9, Duration::from_millis(999)));
    assert!(budget.is_exhausted(10, Duration::ZERO));
    assert!(budget.is_exhausted(0, Duration::from_secs(1)));
    assert!(!Budget::unbounded().is_exhausted(u64::MAX, Duration::from_secs(3600)));
}
