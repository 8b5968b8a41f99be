//! Types shared across the dialog pipeline.

use golem_core::error::GolemError;
use serde::{Deserialize, Serialize};

/// A recognized-speech event as delivered by the ASR collaborator.
///
/// `confidence` and `angle` are optional on the wire; a missing confidence
/// is treated as zero by the intake filter, which rejects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechEvent {
    pub text: String,
    pub confidence: Option<f64>,
    /// Direction of arrival in degrees, when the microphone array reports it.
    pub angle: Option<f64>,
}

impl SpeechEvent {
    /// Parse a raw JSON speech event.
    pub fn parse(raw: &str) -> Result<Self, GolemError> {
        serde_json::from_str(raw).map_err(|e| GolemError::Intake(format!("invalid speech event: {}", e)))
    }
}

/// One message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}
