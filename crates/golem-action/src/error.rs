//! Error types for the action engine.

use golem_core::error::GolemError;

/// Errors from action resolution and execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action handler failed: {0}")]
    HandlerFailed(String),
    #[error("Action class not registered: {0}")]
    UnregisteredHandler(String),
    #[error("Storage error: {0}")]
    Storage(#[from] GolemError),
}

impl From<ActionError> for GolemError {
    fn from(err: ActionError) -> Self {
        GolemError::Action(err.to_string())
    }
}
