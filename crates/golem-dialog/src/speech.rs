//! Speech output boundary.
//!
//! The controller talks to a [`SpeechSink`]; real deployments back it with
//! the robot's TTS client, tests and headless runs use [`LogSpeech`].

use async_trait::async_trait;
use tracing::info;

use crate::error::DialogError;

/// Text-to-speech boundary.
///
/// `speaker_id` selects the synthesizer voice; the controller derives it
/// from the configured language.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    async fn say(&self, text: &str, speaker_id: u32) -> Result<(), DialogError>;
}

/// Sink that logs utterances instead of synthesizing them.
#[derive(Debug, Default)]
pub struct LogSpeech;

#[async_trait]
impl SpeechSink for LogSpeech {
    async fn say(&self, text: &str, speaker_id: u32) -> Result<(), DialogError> {
        info!("Speaking (voice {}): {}", speaker_id, text);
        Ok(())
    }
}

/// Sink that discards utterances, used when speech output is disabled.
#[derive(Debug, Default)]
pub struct NullSpeech;

#[async_trait]
impl SpeechSink for NullSpeech {
    async fn say(&self, _text: &str, _speaker_id: u32) -> Result<(), DialogError> {
        Ok(())
    }
}
