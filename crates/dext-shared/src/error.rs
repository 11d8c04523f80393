//! Error types for dextd.
//!
//! Activation failures never show up here: they become the
//! `ActivationError` state. These are infrastructure errors only.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DextError {
    #[error("Activation controller is no longer running")]
    ControllerStopped,

    #[error("Invalid script step: {0}")]
    InvalidScriptStep(String),
}

impl DextError {
    /// Process exit code for the binary
    pub fn exit_code(&self) -> i32 {
        match self {
            DextError::ControllerStopped => 3,
            DextError::InvalidScriptStep(_) => 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct() {
        assert_eq!(DextError::ControllerStopped.exit_code(), 3);
        assert_eq!(DextError::InvalidScriptStep("x".into()).exit_code(), 64);
    }
}
