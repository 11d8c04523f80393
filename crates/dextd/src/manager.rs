//! Extension manager abstraction
//!
//! The controller never talks to the system's extension-management service
//! directly. It is handed an `ExtensionManager` at construction and registers
//! a `RequestDelegate` with every request it submits; the manager reports
//! outcomes through that delegate, which forwards them into the controller's
//! inbox.
//!
//! ## Usage
//!
//! Production code plugs in the platform backend. Tests and the demo binary
//! use `ScriptedExtensionManager`, which replays a fixed callback sequence.

use std::sync::Arc;

use dext_shared::{
    ExtensionError, ExtensionProperties, ExtensionRequest, ReplacementAction, RequestResult,
};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::message::{ControllerMessage, Notification};

// ============================================================================
// Manager Trait
// ============================================================================

/// Capability to submit activation/deactivation requests
///
/// `submit_request` must not block: outcomes arrive later through the
/// delegate, in the order the subsystem produces them.
pub trait ExtensionManager: Send + Sync {
    fn submit_request(&self, delegate: RequestDelegate);
}

impl<M: ExtensionManager + ?Sized> ExtensionManager for Arc<M> {
    fn submit_request(&self, delegate: RequestDelegate) {
        (**self).submit_request(delegate)
    }
}

impl<M: ExtensionManager + ?Sized> ExtensionManager for Box<M> {
    fn submit_request(&self, delegate: RequestDelegate) {
        (**self).submit_request(delegate)
    }
}

// ============================================================================
// Request Delegate
// ============================================================================

/// Callback sink bound to one submitted request
///
/// Cloneable; every callback is tagged with the request it was created for.
#[derive(Debug, Clone)]
pub struct RequestDelegate {
    request: ExtensionRequest,
    inbox: mpsc::UnboundedSender<ControllerMessage>,
}

impl RequestDelegate {
    pub fn new(request: ExtensionRequest, inbox: mpsc::UnboundedSender<ControllerMessage>) -> Self {
        Self { request, inbox }
    }

    pub fn request(&self) -> &ExtensionRequest {
        &self.request
    }

    /// Ask whether `existing` should be replaced by `replacement`.
    ///
    /// The receiver resolves once the controller has decided. It errors if
    /// the controller is gone.
    pub fn replacement_requested(
        &self,
        existing: ExtensionProperties,
        replacement: ExtensionProperties,
    ) -> oneshot::Receiver<ReplacementAction> {
        let (reply, answer) = oneshot::channel();
        self.deliver(Notification::ReplacementRequested {
            existing,
            replacement,
            reply,
        });
        answer
    }

    pub fn needs_user_approval(&self) {
        self.deliver(Notification::NeedsUserApproval);
    }

    pub fn finished(&self, result: RequestResult) {
        self.deliver(Notification::Finished(result));
    }

    pub fn failed(&self, error: ExtensionError) {
        self.deliver(Notification::Failed(error));
    }

    fn deliver(&self, notification: Notification) {
        let kind = notification.kind();
        let message = ControllerMessage::Callback {
            request: self.request.clone(),
            notification,
        };
        if self.inbox.send(message).is_err() {
            debug!("Controller gone, dropping {} callback for {}", kind, self.request);
        }
    }
}
