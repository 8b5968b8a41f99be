//! Action engine for the Golem controller.
//!
//! Routes symbolic action requests (gesture, movement, system command or a
//! custom class) to the matching handler, runs them without blocking the
//! caller, tracks in-flight work and can preempt all of it at once.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod handler;
pub mod store;
pub mod types;

pub use catalog::{ActionCatalog, CatalogEntry};
pub use error::ActionError;
pub use executor::ActionExecutor;
pub use handler::{
    ActionHandler, GestureHandler, MovementHandler, ResolvedHandler, SystemHandler,
};
pub use store::ActionStore;
pub use types::{ActionClass, ActionPayload, ActionRecord, ExecutionMode, RunningAction};
