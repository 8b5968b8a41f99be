//! CLI argument definitions for the Golem controller binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Golem — a voice-driven behavior controller for humanoid robots.
#[derive(Parser, Debug)]
#[command(name = "golem", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Network interface the robot transport binds to.
    #[arg(short = 'i', long = "interface")]
    pub interface: Option<String>,

    /// Spoken language: "en" or "zh". Selects the synthesis voice.
    #[arg(long = "language")]
    pub language: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Print the action catalog and exit.
    #[arg(long = "list-actions")]
    pub list_actions: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GOLEM_CONFIG env var > ~/.golem/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GOLEM_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the transport interface.
    ///
    /// Priority: --interface flag > GOLEM_INTERFACE env var > config file value.
    pub fn resolve_interface(&self, config_interface: &str) -> String {
        if let Some(ref i) = self.interface {
            return i.clone();
        }
        if let Ok(i) = std::env::var("GOLEM_INTERFACE") {
            return i;
        }
        config_interface.to_string()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".golem").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".golem").join("config.toml");
    }
    PathBuf::from("config.toml")
}
