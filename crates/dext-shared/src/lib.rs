//! Shared types for dextd components.
//!
//! Pure domain vocabulary with no runtime: the activation state machine, the
//! request/result types of the extension-management subsystem, and the status
//! snapshots handed to the presentation layer.

pub mod error;
pub mod request;
pub mod state_machine;
pub mod status;

pub use error::DextError;
pub use request::{
    ExtensionError, ExtensionErrorKind, ExtensionProperties, ExtensionRequest, ReplacementAction,
    RequestAction, RequestResult,
};
pub use state_machine::{process, Event, State};
pub use status::{ActivationStatus, TransitionRecord};

/// Extension activated when no identifier is configured
pub const DEFAULT_DEXT_IDENTIFIER: &str = "com.example.nulldriver.driver";

/// Config file path
pub const CONFIG_PATH: &str = "/etc/dextd/config.toml";

/// Fallback config file path
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/dextd/config.toml";

/// Transition records kept in memory by default
pub const DEFAULT_HISTORY_LIMIT: usize = 64;
