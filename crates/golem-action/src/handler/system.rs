//! System command handler.
//!
//! Posture and power commands, plus the emergency stop. Emergency stop is
//! the one command with side effects beyond its own completion: it halts the
//! motion backend synchronously and then sweeps every running action.

use std::sync::Arc;

use golem_core::types::CancelToken;
use golem_motion::Motion;
use tracing::{error, info, warn};

use crate::error::ActionError;
use crate::store::ActionStore;
use crate::types::ActionPayload;

/// Built-in system commands and their descriptions, in catalog order.
pub(crate) const SYSTEM_COMMANDS: &[(&str, &str)] = &[
    ("stand_up", "Stand up from sitting position"),
    ("sit_down", "Sit down"),
    ("stop", "Stop all actions"),
    ("reset", "Reset robot to home position"),
    ("emergency_stop", "Emergency stop (E-stop)"),
    ("power_off", "Power off the robot"),
    ("power_on", "Power on the robot"),
];

/// Handler for the `system` class.
///
/// Holds the action store directly so the emergency sweep cannot depend on
/// the executor that owns this handler.
pub struct SystemHandler {
    motion: Arc<dyn Motion>,
    store: Arc<ActionStore>,
}

impl SystemHandler {
    pub fn new(motion: Arc<dyn Motion>, store: Arc<ActionStore>) -> Self {
        Self { motion, store }
    }

    fn describe(name: &str) -> Option<&'static str> {
        SYSTEM_COMMANDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, description)| *description)
    }

    pub async fn run(
        &self,
        name: &str,
        _payload: &ActionPayload,
        _token: &CancelToken,
    ) -> Result<bool, ActionError> {
        let name = name.trim().to_lowercase();
        let Some(description) = Self::describe(&name) else {
            warn!("Unknown system command: {}", name);
            return Ok(false);
        };

        info!("Executing system command: {} - {}", name, description);

        if name == "emergency_stop" {
            error!("EMERGENCY STOP ACTIVATED");
            // The physical halt comes first and decides the outcome.
            if let Err(e) = self.motion.stop().await {
                error!("Failed to execute system command {}: {}", name, e);
                return Ok(false);
            }
            // The sweep is secondary; a failure here must not undo the halt.
            if let Err(e) = self.store.cancel_all() {
                warn!("Failed to cancel running actions: {}", e);
            }
            return Ok(true);
        }

        // Posture and power sequences are owned by the platform; they are
        // acknowledged here until the motion backend grows them.
        Ok(true)
    }
}
