//! Gesture action handler.
//!
//! Plays short face/body animations: waving, nodding, bowing and the like.

use std::sync::Arc;

use golem_core::types::CancelToken;
use golem_motion::Motion;
use tracing::{error, info, warn};

use crate::error::ActionError;
use crate::types::ActionPayload;

/// Built-in gestures and their descriptions, in catalog order.
pub(crate) const GESTURES: &[(&str, &str)] = &[
    ("wave", "Waving hand"),
    ("nod", "Nodding head"),
    ("shake_head", "Shaking head"),
    ("thumbs_up", "Thumbs up"),
    ("bow", "Bowing"),
    ("shrug", "Shrugging"),
];

/// Handler for the `gesture` class.
pub struct GestureHandler {
    motion: Arc<dyn Motion>,
}

impl GestureHandler {
    pub fn new(motion: Arc<dyn Motion>) -> Self {
        Self { motion }
    }

    fn describe(name: &str) -> Option<&'static str> {
        GESTURES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, description)| *description)
    }

    pub async fn run(
        &self,
        name: &str,
        _payload: &ActionPayload,
        token: &CancelToken,
    ) -> Result<bool, ActionError> {
        let name = name.trim().to_lowercase();
        let Some(description) = Self::describe(&name) else {
            warn!("Unknown gesture: {}", name);
            return Ok(false);
        };

        info!("Executing gesture: {} - {}", name, description);
        match self.motion.execute_gesture(&name, token).await {
            Ok(completed) => Ok(completed),
            Err(e) => {
                error!("Failed to execute gesture {}: {}", name, e);
                Ok(false)
            }
        }
    }
}
