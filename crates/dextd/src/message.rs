//! Messages drained by the controller's serial executor.
//!
//! Presentation commands and subsystem callbacks share one inbox so they are
//! applied strictly in arrival order.

use dext_shared::{
    ExtensionError, ExtensionProperties, ExtensionRequest, ReplacementAction, RequestResult,
};
use tokio::sync::oneshot;

/// Callback from the extension-management subsystem
#[derive(Debug)]
pub enum Notification {
    /// An older version is installed; the subsystem waits for `reply`
    ReplacementRequested {
        existing: ExtensionProperties,
        replacement: ExtensionProperties,
        reply: oneshot::Sender<ReplacementAction>,
    },
    NeedsUserApproval,
    Finished(RequestResult),
    Failed(ExtensionError),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ReplacementRequested { .. } => "replacement_requested",
            Notification::NeedsUserApproval => "needs_user_approval",
            Notification::Finished(_) => "finished",
            Notification::Failed(_) => "failed",
        }
    }
}

/// Everything the controller task consumes
#[derive(Debug)]
pub enum ControllerMessage {
    /// Activate the given extension, or the configured one
    Activate { identifier: Option<String> },
    /// Deactivate the given extension, or the configured one
    Deactivate { identifier: Option<String> },
    /// A subsystem callback for `request`
    Callback {
        request: ExtensionRequest,
        notification: Notification,
    },
    /// The controller's own activation timer fired
    ActivationTimedOut { attempt: u64 },
    Shutdown,
}
