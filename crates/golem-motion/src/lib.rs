//! Motion primitives for the Golem controller.
//!
//! Defines the `Motion` port that action handlers drive and a simulated
//! backend that plays primitives out in real time while honoring
//! cooperative cancellation.

pub mod sim;

use async_trait::async_trait;
use golem_core::{CancelToken, Result};

pub use sim::SimulatedMotion;

/// Low-level locomotion and gesture primitives.
///
/// Every long-running primitive takes a [`CancelToken`] and polls it between
/// steps. Returning `Ok(true)` means the primitive ran to completion,
/// `Ok(false)` means it was cancelled part way through. `Err` is reserved
/// for backend faults.
#[async_trait]
pub trait Motion: Send + Sync {
    /// Walk the given distance in meters at the given speed.
    async fn move_forward(
        &self,
        distance_m: f64,
        speed_mps: f64,
        token: &CancelToken,
    ) -> Result<bool>;

    /// Rotate in place. Negative angles turn left, positive turn right.
    /// Duration is derived from the magnitude of the angle.
    async fn turn(&self, angle_deg: f64, speed_dps: f64, token: &CancelToken) -> Result<bool>;

    /// Play a named gesture animation.
    async fn execute_gesture(&self, name: &str, token: &CancelToken) -> Result<bool>;

    /// Halt all locomotion immediately. Must not block on running primitives.
    async fn stop(&self) -> Result<bool>;
}
