//! Library-level error enums that callers match on.

use thiserror::Error;

/// Fatal errors raised by `notch-core::driver::Driver`, exit-code-bearing
/// (0 success, 1 no agents, 2 config/repo error, 3 device-access
/// connection failure).
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("configuration error: base_path is required")]
    MissingBasePath,

    #[error("configuration error: collection '{0}' has no recipes")]
    MissingRecipes(String),

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    #[error("no device-access agents supplied")]
    NoAgents,

    #[error("device-access connection failure: {0}")]
    DeviceClientConnect(String),

    #[error("revision-control error: {0}")]
    RevisionControl(#[from] RevisionControlError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoAgents => 1,
            Self::MissingBasePath | Self::MissingRecipes(_) | Self::InvalidConfig(_) => 2,
            Self::RevisionControl(_) | Self::Io(_) => 2,
            Self::DeviceClientConnect(_) => 3,
        }
    }
}

/// Raised by `rulesets::registry::lookup` on an unknown vendor tag.
/// A `Collection` that hits this logs and abandons its recipe without
/// aborting sibling collections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("no such rule-set: {0}")]
    Unknown(String),

    #[error("rule-set '{0}' has an invalid filter pattern: {1}")]
    InvalidPattern(String, String),
}

/// Errors surfaced by a `DeviceClient` implementation.
#[derive(Debug, Error)]
pub enum DeviceClientError {
    #[error("timeout waiting for device response")]
    Timeout,

    #[error("no device-access agents available")]
    NoAgents,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by a `RevisionControl` implementation.
#[derive(Debug, Error)]
pub enum RevisionControlError {
    #[error("revision-control backend failed: {0}")]
    Backend(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
