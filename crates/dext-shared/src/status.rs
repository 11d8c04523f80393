//! Status snapshots published by the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::{Event, State};

/// Read-only view of the controller for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationStatus {
    pub identifier: String,
    pub state: State,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

impl ActivationStatus {
    pub fn new(identifier: &str, state: State) -> Self {
        Self {
            identifier: identifier.to_string(),
            state,
            text: state.status_text().to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// One applied transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub at: DateTime<Utc>,
    pub from: State,
    pub event: Event,
    pub to: State,
}

impl TransitionRecord {
    pub fn new(from: State, event: Event, to: State) -> Self {
        Self {
            at: Utc::now(),
            from,
            event,
            to,
        }
    }
}
