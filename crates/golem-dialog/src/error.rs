//! Error types for the dialog pipeline.

use golem_action::error::ActionError;
use golem_core::error::GolemError;

/// Errors from the dialog pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("decision engine error: {0}")]
    EngineFailed(String),
    #[error("speech output error: {0}")]
    SpeechFailed(String),
    #[error("action error: {0}")]
    Action(#[from] ActionError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<GolemError> for DialogError {
    fn from(err: GolemError) -> Self {
        DialogError::Storage(err.to_string())
    }
}

impl From<DialogError> for GolemError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::EngineFailed(msg) => GolemError::Decision(msg),
            DialogError::SpeechFailed(msg) => GolemError::Speech(msg),
            DialogError::Action(e) => e.into(),
            DialogError::Storage(msg) => GolemError::Storage(msg),
        }
    }
}
