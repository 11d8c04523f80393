//! Tests for state_machine.rs

use dext_shared::state_machine::{process, Event, State};
use std::collections::HashSet;

use Event::*;
use State::*;

/// Expected successor for every (state, event) pair, row by row
const TABLE: [(State, [State; 4]); 5] = [
    (Unloaded, [Activating, ActivationError, ActivationError, ActivationError]),
    (Activating, [Activating, NeedsApproval, Activated, ActivationError]),
    (NeedsApproval, [Activating, NeedsApproval, Activated, ActivationError]),
    (Activated, [Activating, ActivationError, Activated, ActivationError]),
    (ActivationError, [Activating, ActivationError, ActivationError, ActivationError]),
];

fn run(start: State, events: &[Event]) -> Vec<State> {
    let mut trace = vec![start];
    let mut state = start;
    for event in events {
        state = process(state, *event);
        trace.push(state);
    }
    trace
}

#[test]
fn test_transition_table_is_total() {
    let mut checked = 0;
    for (state, row) in TABLE {
        for (event, expected) in Event::ALL.iter().zip(row) {
            assert_eq!(
                process(state, *event),
                expected,
                "process({}, {})",
                state,
                event
            );
            checked += 1;
        }
    }
    assert_eq!(checked, State::ALL.len() * Event::ALL.len());
}

#[test]
fn test_process_is_deterministic() {
    for state in State::ALL {
        for event in Event::ALL {
            let first = process(state, event);
            for _ in 0..10 {
                assert_eq!(process(state, event), first);
            }
        }
    }
}

#[test]
fn test_success_is_idempotent() {
    assert_eq!(process(Activated, ActivationFinished), Activated);
}

#[test]
fn test_error_is_sticky_unless_retried() {
    for event in [PromptForApproval, ActivationFinished, ActivationFailed] {
        assert_eq!(process(ActivationError, event), ActivationError);
    }
    assert_eq!(process(ActivationError, ActivationStarted), Activating);
}

#[test]
fn test_start_always_resets_to_activating() {
    for state in State::ALL {
        assert_eq!(process(state, ActivationStarted), Activating);
    }
}

#[test]
fn test_approval_rows_match_activating() {
    for event in Event::ALL {
        assert_eq!(process(Activating, event), process(NeedsApproval, event));
    }
}

#[test]
fn test_contradicting_signal_after_success() {
    assert_eq!(process(Activated, PromptForApproval), ActivationError);
    assert_eq!(process(Activated, ActivationFailed), ActivationError);
}

#[test]
fn test_scenario_happy_path_with_approval() {
    let trace = run(
        Unloaded,
        &[ActivationStarted, PromptForApproval, ActivationFinished],
    );
    assert_eq!(trace, vec![Unloaded, Activating, NeedsApproval, Activated]);
}

#[test]
fn test_scenario_direct_success() {
    let trace = run(Unloaded, &[ActivationStarted, ActivationFinished]);
    assert_eq!(trace, vec![Unloaded, Activating, Activated]);
}

#[test]
fn test_scenario_failure_then_retry() {
    let trace = run(
        Unloaded,
        &[ActivationStarted, ActivationFailed, ActivationStarted],
    );
    assert_eq!(
        trace,
        vec![Unloaded, Activating, ActivationError, Activating]
    );
}

#[test]
fn test_scenario_early_callback_is_anomaly() {
    assert_eq!(process(Unloaded, PromptForApproval), ActivationError);
    assert_eq!(process(Unloaded, ActivationFinished), ActivationError);
    assert_eq!(process(Unloaded, ActivationFailed), ActivationError);
}

#[test]
fn test_status_text_distinct_and_non_empty() {
    let texts: HashSet<&str> = State::ALL.iter().map(|s| s.status_text()).collect();
    assert_eq!(texts.len(), State::ALL.len());
    assert!(texts.iter().all(|t| !t.trim().is_empty()));
}
