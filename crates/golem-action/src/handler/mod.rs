//! Action handler trait and the built-in handler set.
//!
//! The three built-in classes are a closed set dispatched through
//! [`ResolvedHandler`]; custom registrations plug in through the
//! [`ActionHandler`] trait.

pub mod gesture;
pub mod movement;
pub mod system;

use std::sync::Arc;

use async_trait::async_trait;
use golem_core::types::CancelToken;

use crate::error::ActionError;
use crate::types::ActionPayload;

pub use gesture::GestureHandler;
pub use movement::MovementHandler;
pub use system::SystemHandler;

/// A handler for a custom action class.
///
/// Contract: run the named action until it completes or until the token is
/// observed set. `Ok(true)` means it completed, `Ok(false)` means it was
/// refused, failed or cancelled. `Err` reports a handler fault; the executor
/// logs it and records the attempt as a failure, it never propagates.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(
        &self,
        name: &str,
        payload: &ActionPayload,
        token: &CancelToken,
    ) -> Result<bool, ActionError>;
}

/// The handler an action class resolved to.
///
/// Built-ins are enumerated so their dispatch stays static; only custom
/// registrations go through dynamic dispatch.
#[derive(Clone)]
pub enum ResolvedHandler {
    Gesture(Arc<GestureHandler>),
    Movement(Arc<MovementHandler>),
    System(Arc<SystemHandler>),
    Custom(Arc<dyn ActionHandler>),
}

impl ResolvedHandler {
    pub async fn run(
        &self,
        name: &str,
        payload: &ActionPayload,
        token: &CancelToken,
    ) -> Result<bool, ActionError> {
        match self {
            ResolvedHandler::Gesture(h) => h.run(name, payload, token).await,
            ResolvedHandler::Movement(h) => h.run(name, payload, token).await,
            ResolvedHandler::System(h) => h.run(name, payload, token).await,
            ResolvedHandler::Custom(h) => h.run(name, payload, token).await,
        }
    }
}
