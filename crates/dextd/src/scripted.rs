//! Scripted extension manager
//!
//! Replays a fixed sequence of callbacks into the delegate of every submitted
//! request, synchronously, from inside `submit_request`. The callbacks queue
//! up in the controller's inbox behind the command that submitted them, which
//! is the same ordering the real subsystem gives.
//!
//! ## Example
//!
//! ```rust,ignore
//! let manager = ScriptedExtensionManager::new(vec![ScriptStep::Approve, ScriptStep::Finish]);
//! ```

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use dext_shared::{
    DextError, ExtensionError, ExtensionProperties, ExtensionRequest, ReplacementAction,
    RequestAction, RequestResult,
};
use tokio::sync::oneshot;
use tracing::debug;

use crate::manager::{ExtensionManager, RequestDelegate};

/// Code reported by `fail` steps without an explicit code
const DEFAULT_FAILURE_CODE: i64 = 1;

// ============================================================================
// Script Steps
// ============================================================================

/// One callback to replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Ask to replace an installed older build
    Replace,
    /// Ask for user approval
    Approve,
    /// Finish with `Completed`
    Finish,
    /// Finish with `WillCompleteAfterReboot`
    Reboot,
    /// Fail with the given error code
    Fail(i64),
}

impl FromStr for ScriptStep {
    type Err = DextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = s.trim().to_ascii_lowercase();
        match step.as_str() {
            "replace" => Ok(ScriptStep::Replace),
            "approve" => Ok(ScriptStep::Approve),
            "finish" => Ok(ScriptStep::Finish),
            "reboot" => Ok(ScriptStep::Reboot),
            "fail" => Ok(ScriptStep::Fail(DEFAULT_FAILURE_CODE)),
            other => match other.strip_prefix("fail:") {
                Some(code) => code
                    .parse()
                    .map(ScriptStep::Fail)
                    .map_err(|_| DextError::InvalidScriptStep(s.to_string())),
                None => Err(DextError::InvalidScriptStep(s.to_string())),
            },
        }
    }
}

/// Parse a comma-separated script such as `replace,approve,finish`
pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>, DextError> {
    script
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

// ============================================================================
// Scripted Manager
// ============================================================================

pub struct ScriptedExtensionManager {
    activation_script: Vec<ScriptStep>,
    deactivation_script: Vec<ScriptStep>,
    submitted: Mutex<Vec<ExtensionRequest>>,
    delegates: Mutex<Vec<RequestDelegate>>,
    answers: Mutex<Vec<oneshot::Receiver<ReplacementAction>>>,
}

impl ScriptedExtensionManager {
    /// Replays `activation_script` for activations; deactivations get no callbacks
    pub fn new(activation_script: Vec<ScriptStep>) -> Self {
        Self {
            activation_script,
            deactivation_script: Vec::new(),
            submitted: Mutex::new(Vec::new()),
            delegates: Mutex::new(Vec::new()),
            answers: Mutex::new(Vec::new()),
        }
    }

    /// Never calls back; drive it through `last_delegate`
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_deactivation_script(mut self, script: Vec<ScriptStep>) -> Self {
        self.deactivation_script = script;
        self
    }

    /// Requests in submission order
    pub fn submitted(&self) -> Vec<ExtensionRequest> {
        lock(&self.submitted).clone()
    }

    /// Delegate of the most recent request, for replaying callbacks by hand
    pub fn last_delegate(&self) -> Option<RequestDelegate> {
        lock(&self.delegates).last().cloned()
    }

    /// Replacement answers received so far, oldest first.
    ///
    /// Questions the controller has not answered yet are kept for the next call.
    pub fn replacement_answers(&self) -> Vec<ReplacementAction> {
        let mut pending = lock(&self.answers);
        let mut answered = Vec::new();
        pending.retain_mut(|answer| match answer.try_recv() {
            Ok(action) => {
                answered.push(action);
                false
            }
            Err(oneshot::error::TryRecvError::Empty) => true,
            Err(oneshot::error::TryRecvError::Closed) => false,
        });
        answered
    }

    fn replay(&self, delegate: &RequestDelegate, script: &[ScriptStep]) {
        let identifier = &delegate.request().identifier;
        for step in script {
            debug!("Replaying {:?} for {}", step, delegate.request());
            match step {
                ScriptStep::Replace => {
                    let answer = delegate.replacement_requested(
                        ExtensionProperties::new(identifier.as_str(), "1"),
                        ExtensionProperties::new(identifier.as_str(), "2"),
                    );
                    lock(&self.answers).push(answer);
                }
                ScriptStep::Approve => delegate.needs_user_approval(),
                ScriptStep::Finish => delegate.finished(RequestResult::Completed),
                ScriptStep::Reboot => delegate.finished(RequestResult::WillCompleteAfterReboot),
                ScriptStep::Fail(code) => delegate.failed(ExtensionError::new(
                    *code,
                    format!("scripted failure for {}", identifier),
                )),
            }
        }
    }
}

impl ExtensionManager for ScriptedExtensionManager {
    fn submit_request(&self, delegate: RequestDelegate) {
        lock(&self.submitted).push(delegate.request().clone());
        let script = match delegate.request().action {
            RequestAction::Activation => &self.activation_script,
            RequestAction::Deactivation => &self.deactivation_script,
        };
        self.replay(&delegate, script);
        lock(&self.delegates).push(delegate);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!("replace".parse::<ScriptStep>().unwrap(), ScriptStep::Replace);
        assert_eq!(" Approve ".parse::<ScriptStep>().unwrap(), ScriptStep::Approve);
        assert_eq!("reboot".parse::<ScriptStep>().unwrap(), ScriptStep::Reboot);
        assert_eq!("fail".parse::<ScriptStep>().unwrap(), ScriptStep::Fail(1));
        assert_eq!("fail:8".parse::<ScriptStep>().unwrap(), ScriptStep::Fail(8));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            "explode".parse::<ScriptStep>(),
            Err(DextError::InvalidScriptStep(_))
        ));
        assert!("fail:eight".parse::<ScriptStep>().is_err());
    }

    #[test]
    fn test_parse_script() {
        let script = parse_script("replace, approve,finish").unwrap();
        assert_eq!(
            script,
            vec![ScriptStep::Replace, ScriptStep::Approve, ScriptStep::Finish]
        );
        assert!(parse_script("").unwrap().is_empty());
        assert!(parse_script("approve,bogus").is_err());
    }
}
