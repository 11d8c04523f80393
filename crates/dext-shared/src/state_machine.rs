//! Driver loading state machine.
//!
//! Five states describe the extension's lifecycle as seen from this process
//! (not the kernel's ground truth):
//! - unloaded: nothing requested yet
//! - activating: a request was issued and is in flight
//! - needs_approval: in flight, waiting for the user to approve
//! - activated: the subsystem reported success
//! - activation_error: failure or an unexpected callback
//!
//! `process` is the whole transition table. It is total and has no side
//! effects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Perceived lifecycle stage of the extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Unloaded,
    Activating,
    NeedsApproval,
    Activated,
    ActivationError,
}

impl State {
    /// Every state, in table order
    pub const ALL: [State; 5] = [
        State::Unloaded,
        State::Activating,
        State::NeedsApproval,
        State::Activated,
        State::ActivationError,
    ];

    /// Fixed user-facing text for this state
    pub fn status_text(&self) -> &'static str {
        match self {
            State::Unloaded => "Driver isn't loaded.",
            State::Activating => "Activating driver, please wait.",
            State::NeedsApproval => "Please follow the prompt to approve the driver.",
            State::Activated => "Driver has been activated and is ready to use.",
            State::ActivationError => {
                "Driver has experienced an error during activation.\nPlease check the logs to find the error."
            }
        }
    }

    /// True while a request is outstanding
    pub fn is_in_progress(&self) -> bool {
        matches!(self, State::Activating | State::NeedsApproval)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Unloaded => write!(f, "unloaded"),
            State::Activating => write!(f, "activating"),
            State::NeedsApproval => write!(f, "needs_approval"),
            State::Activated => write!(f, "activated"),
            State::ActivationError => write!(f, "activation_error"),
        }
    }
}

/// Stimulus applied to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// A local activation request was issued (or a replacement was decided)
    ActivationStarted,
    /// The subsystem asked the user for approval
    PromptForApproval,
    /// The subsystem reported the request finished
    ActivationFinished,
    /// The subsystem reported the request failed
    ActivationFailed,
}

impl Event {
    pub const ALL: [Event; 4] = [
        Event::ActivationStarted,
        Event::PromptForApproval,
        Event::ActivationFinished,
        Event::ActivationFailed,
    ];
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ActivationStarted => write!(f, "activation_started"),
            Event::PromptForApproval => write!(f, "prompt_for_approval"),
            Event::ActivationFinished => write!(f, "activation_finished"),
            Event::ActivationFailed => write!(f, "activation_failed"),
        }
    }
}

/// Successor state for `(state, event)`.
///
/// `ActivationStarted` always restarts at `Activating`. Anything arriving
/// before a request, or contradicting a success, lands in `ActivationError`.
pub fn process(state: State, event: Event) -> State {
    match state {
        State::Unloaded => match event {
            Event::ActivationStarted => State::Activating,
            Event::PromptForApproval | Event::ActivationFinished | Event::ActivationFailed => {
                State::ActivationError
            }
        },

        // Approval is a sub-phase of activation: both rows are identical.
        State::Activating | State::NeedsApproval => match event {
            Event::ActivationStarted => State::Activating,
            Event::PromptForApproval => State::NeedsApproval,
            Event::ActivationFinished => State::Activated,
            Event::ActivationFailed => State::ActivationError,
        },

        State::Activated => match event {
            Event::ActivationStarted => State::Activating,
            Event::PromptForApproval | Event::ActivationFailed => State::ActivationError,
            Event::ActivationFinished => State::Activated,
        },

        State::ActivationError => match event {
            Event::ActivationStarted => State::Activating,
            Event::PromptForApproval | Event::ActivationFinished | Event::ActivationFailed => {
                State::ActivationError
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unloaded() {
        assert_eq!(State::default(), State::Unloaded);
    }

    #[test]
    fn test_in_progress_states() {
        assert!(State::Activating.is_in_progress());
        assert!(State::NeedsApproval.is_in_progress());
        assert!(!State::Unloaded.is_in_progress());
        assert!(!State::Activated.is_in_progress());
        assert!(!State::ActivationError.is_in_progress());
    }

    #[test]
    fn test_display_snake_case() {
        assert_eq!(State::NeedsApproval.to_string(), "needs_approval");
        assert_eq!(Event::PromptForApproval.to_string(), "prompt_for_approval");
    }

    #[test]
    fn test_serde_matches_display() {
        for state in State::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }
}
