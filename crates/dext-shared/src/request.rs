//! Request vocabulary of the extension-management subsystem.
//!
//! These are the values that cross the boundary between the controller and
//! the subsystem: what was asked, what the subsystem reports about installed
//! extensions, and how a request ended.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What a request asks the subsystem to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Activation,
    Deactivation,
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAction::Activation => write!(f, "activation"),
            RequestAction::Deactivation => write!(f, "deactivation"),
        }
    }
}

/// A single submitted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub identifier: String,
    pub action: RequestAction,
}

impl ExtensionRequest {
    pub fn activation(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action: RequestAction::Activation,
        }
    }

    pub fn deactivation(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action: RequestAction::Deactivation,
        }
    }

    pub fn is_activation(&self) -> bool {
        self.action == RequestAction::Activation
    }
}

impl fmt::Display for ExtensionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.action, self.identifier)
    }
}

/// Properties the subsystem reports for an installed or incoming extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionProperties {
    pub bundle_identifier: String,
    /// Build version (CFBundleVersion style, e.g. "42" or "1.2.3")
    pub bundle_version: String,
    /// Marketing version
    pub bundle_short_version: String,
}

impl ExtensionProperties {
    pub fn new(identifier: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            bundle_identifier: identifier.into(),
            bundle_short_version: version.clone(),
            bundle_version: version,
        }
    }
}

impl fmt::Display for ExtensionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.bundle_identifier, self.bundle_short_version, self.bundle_version
        )
    }
}

/// Answer to a "replace the existing extension?" question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementAction {
    Cancel,
    Replace,
}

/// How a finished request completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestResult {
    Completed,
    WillCompleteAfterReboot,
}

impl RequestResult {
    pub fn raw_value(&self) -> i64 {
        match self {
            RequestResult::Completed => 0,
            RequestResult::WillCompleteAfterReboot => 1,
        }
    }
}

/// Classification of the subsystem's numeric error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionErrorKind {
    Unknown,
    MissingEntitlement,
    UnsupportedParentBundleLocation,
    ExtensionNotFound,
    ExtensionMissingIdentifier,
    DuplicateExtensionIdentifier,
    UnknownExtensionCategory,
    CodeSignatureInvalid,
    ValidationFailed,
    ForbiddenBySystemPolicy,
    RequestCanceled,
    RequestSuperseded,
    AuthorizationRequired,
}

impl ExtensionErrorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::MissingEntitlement,
            3 => Self::UnsupportedParentBundleLocation,
            4 => Self::ExtensionNotFound,
            5 => Self::ExtensionMissingIdentifier,
            6 => Self::DuplicateExtensionIdentifier,
            7 => Self::UnknownExtensionCategory,
            8 => Self::CodeSignatureInvalid,
            9 => Self::ValidationFailed,
            10 => Self::ForbiddenBySystemPolicy,
            11 => Self::RequestCanceled,
            12 => Self::RequestSuperseded,
            13 => Self::AuthorizationRequired,
            _ => Self::Unknown,
        }
    }

    /// Operator hint for the common development failures
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ExtensionNotFound => Some(
                "the dext identifier in the configuration must match the one in the bundle",
            ),
            Self::CodeSignatureInvalid => Some(
                "signing problem; during development sign to run locally with automatic signing",
            ),
            _ => None,
        }
    }
}

/// Failure reported by the subsystem for a request
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("extension request failed (code {code}): {description}")]
pub struct ExtensionError {
    pub code: i64,
    pub description: String,
}

impl ExtensionError {
    pub fn new(code: i64, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ExtensionErrorKind {
        ExtensionErrorKind::from_code(self.code)
    }
}
