//! dextd library - activation controller for a driver extension.

pub mod config;
pub mod controller;
pub mod logging;
pub mod manager;
pub mod message;
pub mod policy;
pub mod scripted;
pub mod service;

pub use config::Config;
pub use controller::ActivationController;
pub use manager::{ExtensionManager, RequestDelegate};
pub use message::{ControllerMessage, Notification};
pub use policy::ReplacementPolicy;
pub use scripted::{parse_script, ScriptStep, ScriptedExtensionManager};
pub use service::{ControllerHandle, Stopped};
