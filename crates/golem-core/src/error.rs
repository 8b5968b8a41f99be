use thiserror::Error;

/// Top-level error type for the Golem controller.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for GolemError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GolemError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Motion error: {0}")]
    Motion(String),

    #[error("Action error: {0}")]
    Action(String),

    #[error("Intake error: {0}")]
    Intake(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Decision error: {0}")]
    Decision(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GolemError {
    fn from(err: toml::de::Error) -> Self {
        GolemError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GolemError {
    fn from(err: toml::ser::Error) -> Self {
        GolemError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GolemError {
    fn from(err: serde_json::Error) -> Self {
        GolemError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Golem operations.
pub type Result<T> = std::result::Result<T, GolemError>;
