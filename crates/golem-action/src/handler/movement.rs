//! Movement action handler.
//!
//! Maps symbolic locomotion commands onto the motion primitives. Distances
//! and angles come from the request payload, with configured defaults when
//! the payload gives none.

use std::sync::Arc;

use golem_core::config::MotionConfig;
use golem_core::types::CancelToken;
use golem_motion::Motion;
use tracing::{error, info, warn};

use crate::error::ActionError;
use crate::types::ActionPayload;

/// Built-in movements and their descriptions, in catalog order.
pub(crate) const MOVEMENTS: &[(&str, &str)] = &[
    ("forward", "Move forward"),
    ("backward", "Move backward"),
    ("left", "Move left"),
    ("right", "Move right"),
    ("turn_left", "Turn left"),
    ("turn_right", "Turn right"),
    ("walk", "Start walking"),
    ("stop", "Stop moving"),
];

/// Handler for the `movement` class.
pub struct MovementHandler {
    motion: Arc<dyn Motion>,
    config: MotionConfig,
}

impl MovementHandler {
    pub fn new(motion: Arc<dyn Motion>, config: MotionConfig) -> Self {
        Self { motion, config }
    }

    fn describe(name: &str) -> Option<&'static str> {
        MOVEMENTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, description)| *description)
    }

    pub async fn run(
        &self,
        name: &str,
        payload: &ActionPayload,
        token: &CancelToken,
    ) -> Result<bool, ActionError> {
        let name = name.trim().to_lowercase();
        let Some(description) = Self::describe(&name) else {
            warn!("Unknown movement: {}", name);
            return Ok(false);
        };

        let distance = payload.data.get("distance").and_then(|v| v.as_f64());
        match distance {
            Some(d) => info!("Executing movement: {} - {} ({}m)", name, description, d),
            None => info!("Executing movement: {} - {}", name, description),
        }

        let result = match name.as_str() {
            // A zero distance falls back to the default walking distance.
            // Backward rides the forward primitive for now.
            "forward" | "backward" | "walk" => {
                let distance_m = distance
                    .filter(|d| *d != 0.0)
                    .unwrap_or(self.config.default_distance_m);
                self.motion
                    .move_forward(distance_m, self.config.default_speed_mps, token)
                    .await
            }
            "turn_left" => {
                let angle = distance.map(|d| -d).unwrap_or(-self.config.default_turn_deg);
                self.motion
                    .turn(angle, self.config.turn_speed_dps, token)
                    .await
            }
            "turn_right" => {
                let angle = distance.unwrap_or(self.config.default_turn_deg);
                self.motion
                    .turn(angle, self.config.turn_speed_dps, token)
                    .await
            }
            "stop" => self.motion.stop().await,
            _ => {
                // left/right sidestepping has no motion primitive yet.
                warn!("Movement {} not implemented in motion mapping", name);
                return Ok(false);
            }
        };

        match result {
            Ok(completed) => Ok(completed),
            Err(e) => {
                error!("Failed to execute movement {}: {}", name, e);
                Ok(false)
            }
        }
    }
}
