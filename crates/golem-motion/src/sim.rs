//! Simulated motion backend.
//!
//! Plays primitives out in real time without touching hardware. Intended as
//! the single place to swap in a real SDK transport later.

use std::time::Duration;

use async_trait::async_trait;
use golem_core::config::MotionConfig;
use golem_core::{CancelToken, Result};
use tracing::{debug, info};

use crate::Motion;

/// Motion backend that sleeps in place of actuating.
///
/// Durations are derived from the requested distance or angle and the
/// configured speeds, and the cancel token is polled once per step interval.
pub struct SimulatedMotion {
    config: MotionConfig,
}

impl SimulatedMotion {
    pub fn new(config: MotionConfig) -> Self {
        Self { config }
    }

    /// Sleep for `total_secs`, polling the token once per step interval.
    /// Returns false as soon as cancellation is observed.
    async fn run_for(&self, total_secs: f64, token: &CancelToken) -> bool {
        let step = Duration::from_millis(self.config.step_interval_ms);
        let step_secs = step.as_secs_f64();
        let mut elapsed = 0.0;
        while elapsed < total_secs {
            if token.is_cancelled() {
                return false;
            }
            tokio::time::sleep(step).await;
            elapsed += step_secs;
        }
        true
    }
}

#[async_trait]
impl Motion for SimulatedMotion {
    async fn move_forward(
        &self,
        distance_m: f64,
        speed_mps: f64,
        token: &CancelToken,
    ) -> Result<bool> {
        info!(distance_m, speed_mps, "Moving forward");
        let total_secs = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };
        let completed = self.run_for(total_secs, token).await;
        if !completed {
            info!("Move cancelled");
        }
        Ok(completed)
    }

    async fn turn(&self, angle_deg: f64, speed_dps: f64, token: &CancelToken) -> Result<bool> {
        info!(angle_deg, speed_dps, "Turning");
        let total_secs = if speed_dps > 0.0 {
            angle_deg.abs() / speed_dps
        } else {
            0.0
        };
        let completed = self.run_for(total_secs, token).await;
        if !completed {
            info!("Turn cancelled");
        }
        Ok(completed)
    }

    async fn execute_gesture(&self, name: &str, token: &CancelToken) -> Result<bool> {
        info!(gesture = %name, "Executing gesture");
        // Gestures are quick; the token is checked once up front only.
        if token.is_cancelled() {
            info!("Gesture cancelled");
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_secs_f64(self.config.gesture_duration_secs)).await;
        Ok(true)
    }

    async fn stop(&self) -> Result<bool> {
        debug!("Stop command");
        Ok(true)
    }
}
