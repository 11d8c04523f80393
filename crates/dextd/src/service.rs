//! Serial executor for the activation controller.
//!
//! One tokio task owns the controller and drains a single inbox. Commands from
//! the presentation layer and callbacks from the subsystem go through the same
//! queue, so the state only ever changes on this task and in arrival order.
//!
//! The controller keeps a sender to its own inbox for delegates and timers, so
//! the queue never closes by itself. The task stops on `Shutdown`, which
//! `ControllerHandle::shutdown` sends and dropping the handle sends too.

use dext_shared::{ActivationStatus, DextError, State, TransitionRecord};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ControllerConfig;
use crate::controller::ActivationController;
use crate::manager::ExtensionManager;
use crate::message::ControllerMessage;

/// Handle to a running controller task
///
/// Commands only enqueue; they return before anything is applied. Dropping
/// the handle asks the task to stop once its queue is empty.
pub struct ControllerHandle {
    inbox: mpsc::UnboundedSender<ControllerMessage>,
    status: watch::Receiver<ActivationStatus>,
    task: Option<JoinHandle<Vec<TransitionRecord>>>,
}

/// What a stopped controller left behind
#[derive(Debug, Clone)]
pub struct Stopped {
    /// Snapshot after the last applied message
    pub status: ActivationStatus,
    pub history: Vec<TransitionRecord>,
}

/// Spawn a controller for `identifier` on the current runtime
pub fn spawn<M>(manager: M, identifier: impl Into<String>, config: &ControllerConfig) -> ControllerHandle
where
    M: ExtensionManager + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = ActivationController::new(manager, identifier, config, tx.clone());
    let status = controller.subscribe();
    let task = tokio::spawn(run(controller, rx));

    ControllerHandle {
        inbox: tx,
        status,
        task: Some(task),
    }
}

/// Drain `inbox` until `Shutdown` has been seen and the queue is empty, then
/// hand back the transition history
pub async fn run<M: ExtensionManager>(
    mut controller: ActivationController<M>,
    mut inbox: mpsc::UnboundedReceiver<ControllerMessage>,
) -> Vec<TransitionRecord> {
    info!("Activation controller running for {}", controller.identifier());

    while let Some(message) = inbox.recv().await {
        if matches!(message, ControllerMessage::Shutdown) {
            // Apply what is already queued, accept nothing new.
            inbox.close();
            continue;
        }
        controller.handle_message(message);
    }

    info!("Activation controller stopped in state {}", controller.state());
    controller.into_history()
}

impl ControllerHandle {
    pub fn activate(&self) -> Result<(), DextError> {
        self.send(ControllerMessage::Activate { identifier: None })
    }

    pub fn activate_extension(&self, identifier: &str) -> Result<(), DextError> {
        self.send(ControllerMessage::Activate {
            identifier: Some(identifier.to_string()),
        })
    }

    pub fn deactivate(&self) -> Result<(), DextError> {
        self.send(ControllerMessage::Deactivate { identifier: None })
    }

    pub fn deactivate_extension(&self, identifier: &str) -> Result<(), DextError> {
        self.send(ControllerMessage::Deactivate {
            identifier: Some(identifier.to_string()),
        })
    }

    /// Latest published snapshot
    pub fn status(&self) -> ActivationStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> State {
        self.status.borrow().state
    }

    pub fn current_status_text(&self) -> &'static str {
        self.state().status_text()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivationStatus> {
        self.status.clone()
    }

    /// Wait until a published snapshot satisfies `predicate` (checked against
    /// the current one first)
    pub async fn wait_until<F>(&self, predicate: F) -> Result<ActivationStatus, DextError>
    where
        F: FnMut(&ActivationStatus) -> bool,
    {
        let mut status = self.status.clone();
        let matched = status
            .wait_for(predicate)
            .await
            .map_err(|_| DextError::ControllerStopped)?;
        Ok(matched.clone())
    }

    /// Stop the task after everything already queued has been applied
    pub async fn shutdown(self) -> Result<Vec<TransitionRecord>, DextError> {
        Ok(self.stop().await?.history)
    }

    /// Like `shutdown`, also returning the final snapshot. Anything still
    /// queued when this is called is reflected in `status`.
    pub async fn stop(mut self) -> Result<Stopped, DextError> {
        // A closed inbox means the task is already gone; join reports it.
        let _ = self.inbox.send(ControllerMessage::Shutdown);
        let task = self.task.take().ok_or(DextError::ControllerStopped)?;
        let history = task.await.map_err(|_| DextError::ControllerStopped)?;
        let status = self.status.borrow().clone();
        Ok(Stopped { status, history })
    }

    fn send(&self, message: ControllerMessage) -> Result<(), DextError> {
        self.inbox
            .send(message)
            .map_err(|_| DextError::ControllerStopped)
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.inbox.send(ControllerMessage::Shutdown);
        }
    }
}
