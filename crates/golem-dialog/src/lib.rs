//! Dialog pipeline for the Golem controller.
//!
//! Takes recognized-speech events through intake filtering, conversation
//! context, the decision engine, and finally the dispatcher that turns a
//! decision object into spoken output and action submissions.

pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod intake;
pub mod speech;
pub mod types;

pub use context::ConversationContext;
pub use controller::Controller;
pub use dispatcher::Dispatcher;
pub use engine::{DecisionEngine, RuleEngine};
pub use error::DialogError;
pub use intake::{IntakeDecision, IntakeFilter};
pub use speech::{LogSpeech, NullSpeech, SpeechSink};
pub use types::{SpeechEvent, Turn};
