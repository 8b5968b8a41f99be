use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GolemError, Result};

/// Top-level configuration for the Golem controller.
///
/// Loaded from `~/.golem/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GolemConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl Default for GolemConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            intake: IntakeConfig::default(),
            motion: MotionConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl GolemConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GolemConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GolemError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Network interface the robot transport binds to.
    pub network_interface: String,
    /// Spoken language: "en" or "zh". Selects the synthesis voice.
    pub language: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            network_interface: "eth0".to_string(),
            language: "en".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Utterance intake filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Minimum recognizer confidence for an utterance to be considered.
    pub min_confidence: f64,
    /// Minimum seconds between two accepted utterances.
    pub debounce_secs: f64,
    /// Number of conversation messages retained for the decision engine.
    pub context_turns: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            debounce_secs: 1.2,
            context_turns: 10,
        }
    }
}

/// Motion primitive defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Distance in meters walked when a command gives none.
    pub default_distance_m: f64,
    /// Forward walking speed in meters per second.
    pub default_speed_mps: f64,
    /// Degrees turned when a command gives no magnitude.
    pub default_turn_deg: f64,
    /// Turning speed in degrees per second.
    pub turn_speed_dps: f64,
    /// Seconds a single gesture takes to play out.
    pub gesture_duration_secs: f64,
    /// Cancellation poll interval in milliseconds while a primitive runs.
    pub step_interval_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            default_distance_m: 0.5,
            default_speed_mps: 0.2,
            default_turn_deg: 90.0,
            turn_speed_dps: 30.0,
            gesture_duration_secs: 0.5,
            step_interval_ms: 100,
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether spoken replies are synthesized at all.
    pub enabled: bool,
    /// Transport topic the speech recognizer publishes on.
    pub asr_topic: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            asr_topic: "rt/audio_msg".to_string(),
        }
    }
}
