//! Activation controller
//!
//! Owns the single `State` of the managed extension. Requests go out through
//! the injected `ExtensionManager`; every callback that comes back is turned
//! into exactly one `Event` and run through `process`.
//!
//! The controller is not thread-safe on purpose. It is driven by one serial
//! executor (see `service`) that applies commands and callbacks in arrival
//! order. Callbacks are not correlated with the request that caused them: a
//! late callback from a superseded request is applied to whatever the state
//! is when it arrives.
//!
//! Deactivation requests are submitted and their callbacks logged, but they
//! never touch the state machine.

use std::collections::VecDeque;
use std::time::Duration;

use dext_shared::{
    process, ActivationStatus, Event, ExtensionError, ExtensionProperties, ExtensionRequest,
    ReplacementAction, RequestResult, State, TransitionRecord,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::manager::{ExtensionManager, RequestDelegate};
use crate::message::{ControllerMessage, Notification};
use crate::policy::ReplacementPolicy;

pub struct ActivationController<M: ExtensionManager> {
    manager: M,
    identifier: String,
    /// Extension named by the latest activation; labels published status
    active_identifier: String,
    policy: ReplacementPolicy,
    activation_timeout: Option<Duration>,
    state: State,
    /// Bumped on every activate(); tags our own timers only
    attempt: u64,
    inbox: mpsc::UnboundedSender<ControllerMessage>,
    status: watch::Sender<ActivationStatus>,
    history: VecDeque<TransitionRecord>,
    history_limit: usize,
}

impl<M: ExtensionManager> ActivationController<M> {
    /// Create a controller in `Unloaded`.
    ///
    /// `inbox` is where delegates deliver callbacks; whoever owns the
    /// receiving end must feed them back through `handle_message`.
    pub fn new(
        manager: M,
        identifier: impl Into<String>,
        config: &ControllerConfig,
        inbox: mpsc::UnboundedSender<ControllerMessage>,
    ) -> Self {
        let identifier = identifier.into();
        let state = State::Unloaded;
        let (status, _) = watch::channel(ActivationStatus::new(&identifier, state));
        Self {
            manager,
            active_identifier: identifier.clone(),
            identifier,
            policy: config.replacement_policy,
            activation_timeout: config.activation_timeout(),
            state,
            attempt: 0,
            inbox,
            status,
            history: VecDeque::new(),
            history_limit: config.history_limit,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Extension the current state refers to
    pub fn active_identifier(&self) -> &str {
        &self.active_identifier
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn current_status_text(&self) -> &'static str {
        self.state.status_text()
    }

    pub fn status(&self) -> ActivationStatus {
        self.status.borrow().clone()
    }

    /// Receiver updated after every transition
    pub fn subscribe(&self) -> watch::Receiver<ActivationStatus> {
        self.status.subscribe()
    }

    /// Applied transitions, oldest first
    pub fn history(&self) -> Vec<TransitionRecord> {
        self.history.iter().cloned().collect()
    }

    pub fn into_history(self) -> Vec<TransitionRecord> {
        self.history.into()
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Activate the configured extension
    pub fn activate(&mut self) {
        let identifier = self.identifier.clone();
        self.activate_extension(&identifier);
    }

    /// Submit an activation request and move to `Activating`.
    ///
    /// Allowed in any state. An in-flight request is not cancelled.
    pub fn activate_extension(&mut self, identifier: &str) {
        let request = ExtensionRequest::activation(identifier);
        info!("Submitting {}", request);
        self.manager
            .submit_request(RequestDelegate::new(request, self.inbox.clone()));

        self.attempt += 1;
        self.active_identifier = identifier.to_string();
        self.apply(Event::ActivationStarted);
        self.arm_activation_timeout();
    }

    /// Deactivate the configured extension
    pub fn deactivate(&mut self) {
        let identifier = self.identifier.clone();
        self.deactivate_extension(&identifier);
    }

    /// Submit a deactivation request. The state is left alone.
    pub fn deactivate_extension(&mut self, identifier: &str) {
        let request = ExtensionRequest::deactivation(identifier);
        info!("Submitting {}", request);
        self.manager
            .submit_request(RequestDelegate::new(request, self.inbox.clone()));
    }

    // ------------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------------

    pub fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Activate { identifier } => match identifier {
                Some(id) => self.activate_extension(&id),
                None => self.activate(),
            },
            ControllerMessage::Deactivate { identifier } => match identifier {
                Some(id) => self.deactivate_extension(&id),
                None => self.deactivate(),
            },
            ControllerMessage::Callback {
                request,
                notification,
            } => self.handle_callback(&request, notification),
            ControllerMessage::ActivationTimedOut { attempt } => {
                self.on_activation_timed_out(attempt)
            }
            ControllerMessage::Shutdown => debug!("Shutdown is handled by the executor"),
        }
    }

    /// Route one subsystem callback
    pub fn handle_callback(&mut self, request: &ExtensionRequest, notification: Notification) {
        if !request.is_activation() {
            self.observe_deactivation(request, notification);
            return;
        }

        match notification {
            Notification::ReplacementRequested {
                existing,
                replacement,
                reply,
            } => {
                let action = self.on_replacement_requested(&existing, &replacement);
                if reply.send(action).is_err() {
                    debug!("Subsystem stopped waiting for the replacement answer");
                }
            }
            Notification::NeedsUserApproval => self.on_needs_user_approval(),
            Notification::Finished(result) => self.on_finished(result),
            Notification::Failed(error) => self.on_failed(&error),
        }
    }

    /// An installed extension would be replaced. Restarts progress tracking
    /// whatever the answer.
    pub fn on_replacement_requested(
        &mut self,
        existing: &ExtensionProperties,
        replacement: &ExtensionProperties,
    ) -> ReplacementAction {
        info!("Replacement requested: {} -> {}", existing, replacement);
        let action = self.policy.decide(existing, replacement);
        info!("Replacement answer: {:?} (policy {:?})", action, self.policy);
        self.apply(Event::ActivationStarted);
        action
    }

    pub fn on_needs_user_approval(&mut self) {
        info!("Request needs user approval");
        self.apply(Event::PromptForApproval);
    }

    pub fn on_finished(&mut self, result: RequestResult) {
        info!("Request finished with result {}", result.raw_value());
        if result == RequestResult::WillCompleteAfterReboot {
            warn!("Activation completes after the next reboot");
        }
        self.apply(Event::ActivationFinished);
    }

    pub fn on_failed(&mut self, error: &ExtensionError) {
        warn!(
            "Request failed: code {} ({:?}): {}",
            error.code,
            error.kind(),
            error.description
        );
        if let Some(hint) = error.kind().hint() {
            warn!("Hint: {}", hint);
        }
        self.apply(Event::ActivationFailed);
    }

    /// Timer for `attempt` fired. Ignored unless it is still the latest
    /// attempt and nothing has settled it.
    pub fn on_activation_timed_out(&mut self, attempt: u64) {
        if attempt != self.attempt || !self.state.is_in_progress() {
            debug!(
                "Ignoring timeout for attempt {} (current {}, state {})",
                attempt, self.attempt, self.state
            );
            return;
        }
        warn!("Activation attempt {} timed out in state {}", attempt, self.state);
        self.apply(Event::ActivationFailed);
    }

    fn observe_deactivation(&mut self, request: &ExtensionRequest, notification: Notification) {
        match notification {
            Notification::ReplacementRequested {
                existing,
                replacement,
                reply,
            } => {
                let action = self.policy.decide(&existing, &replacement);
                info!("{}: replacement answered {:?}", request, action);
                let _ = reply.send(action);
            }
            Notification::NeedsUserApproval => info!("{}: needs user approval", request),
            Notification::Finished(result) => {
                info!("{}: finished with result {}", request, result.raw_value())
            }
            Notification::Failed(error) => warn!("{}: {}", request, error),
        }
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    fn apply(&mut self, event: Event) {
        let from = self.state;
        let to = process(from, event);
        self.state = to;

        if to == State::ActivationError && event != Event::ActivationFailed {
            warn!("Unexpected {} while {}", event, from);
        }
        info!("State {} --{}--> {}", from, event, to);

        self.record(TransitionRecord::new(from, event, to));
        self.status
            .send_replace(ActivationStatus::new(&self.active_identifier, to));
    }

    fn record(&mut self, record: TransitionRecord) {
        if self.history_limit == 0 {
            return;
        }
        while self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    fn arm_activation_timeout(&self) {
        let timeout = match self.activation_timeout {
            Some(timeout) => timeout,
            None => return,
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime, activation timeout not armed");
                return;
            }
        };

        let inbox = self.inbox.clone();
        let attempt = self.attempt;
        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = inbox.send(ControllerMessage::ActivationTimedOut { attempt });
        });
    }
}
