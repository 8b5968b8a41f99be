//! Core types and value objects for the action engine.

use std::fmt;

use golem_core::types::{CancelToken, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// The three built-in action classes.
///
/// Custom classes registered at runtime stay plain strings; this enum only
/// tags the handlers that ship with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Gesture,
    Movement,
    System,
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionClass::Gesture => write!(f, "gesture"),
            ActionClass::Movement => write!(f, "movement"),
            ActionClass::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for ActionClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gesture" => Ok(ActionClass::Gesture),
            "movement" => Ok(ActionClass::Movement),
            "system" => Ok(ActionClass::System),
            _ => Err(format!("Unknown action class: {}", s)),
        }
    }
}

/// Whether an execution ran on the caller or on its own task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Async,
    Sync,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Async => write!(f, "async"),
            ExecutionMode::Sync => write!(f, "sync"),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// Parameters passed to action handlers.
///
/// An open key/value map; handlers pick out what they understand (for
/// instance `distance` for movements) and ignore the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPayload {
    pub data: serde_json::Value,
}

impl ActionPayload {
    /// A payload with no parameters.
    pub fn empty() -> Self {
        Self {
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Build a payload from a JSON object, dropping the given routing keys.
    pub fn from_object(
        object: &serde_json::Map<String, serde_json::Value>,
        exclude: &[&str],
    ) -> Self {
        let data: serde_json::Map<String, serde_json::Value> = object
            .iter()
            .filter(|(key, _)| !exclude.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self {
            data: serde_json::Value::Object(data),
        }
    }
}

/// An entry in the execution history (audit trail).
///
/// Appended exactly once per execution attempt, including attempts that were
/// refused because no handler existed. Async entries appear in completion
/// order, not submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub class: String,
    pub name: String,
    pub success: bool,
    pub mode: ExecutionMode,
    /// Set for async executions; sync and refused attempts have no id.
    pub id: Option<Uuid>,
    pub executed_at: Timestamp,
}

/// Book-keeping for an in-flight asynchronous action.
///
/// Exists only while its task runs; inserted before the task starts and
/// removed under the same lock that appends the history record.
#[derive(Debug, Clone)]
pub struct RunningAction {
    pub class: String,
    pub name: String,
    pub token: CancelToken,
    pub started_at: Timestamp,
}
