pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::GolemConfig;
pub use error::{GolemError, Result};
pub use types::*;
