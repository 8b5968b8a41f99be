//! Golem controller: central coordinator wiring intake, context, engine and
//! dispatch.
//!
//! Owns the event bus and the action executor; one instance per robot.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use golem_action::{ActionExecutor, ActionPayload};
use golem_core::config::GolemConfig;
use golem_core::events::ControllerEvent;
use golem_core::types::{ActionId, Timestamp};
use golem_motion::Motion;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, Notify};
use tracing::{error, info};

use crate::context::ConversationContext;
use crate::dispatcher::Dispatcher;
use crate::engine::DecisionEngine;
use crate::error::DialogError;
use crate::intake::{IntakeDecision, IntakeFilter};
use crate::speech::SpeechSink;
use crate::types::SpeechEvent;

/// Spoken when the decision engine cannot be reached. Not part of the
/// conversation context, so a recovered engine never sees it as a turn.
const FALLBACK_REPLY: &str = "Sorry, I am having trouble connecting to the cloud.";

/// Event bus capacity. Lagging subscribers lose oldest events first.
const EVENT_CAPACITY: usize = 256;

/// Central controller that coordinates intake, decisions and actions.
pub struct Controller {
    config: GolemConfig,
    intake: Mutex<IntakeFilter>,
    context: Mutex<ConversationContext>,
    engine: Arc<dyn DecisionEngine>,
    dispatcher: Arc<Dispatcher>,
    executor: Arc<ActionExecutor>,
    events: broadcast::Sender<ControllerEvent>,
    shutdown: Notify,
}

impl Controller {
    /// Create a controller wired to the given motion backend, decision
    /// engine and speech sink.
    pub fn new(
        config: GolemConfig,
        motion: Arc<dyn Motion>,
        engine: Arc<dyn DecisionEngine>,
        speech: Arc<dyn SpeechSink>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let executor = Arc::new(ActionExecutor::new(
            motion,
            config.motion.clone(),
            events.clone(),
        ));
        let speaker_id = if config.general.language == "en" { 1 } else { 0 };
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&executor),
            speech,
            speaker_id,
            events.clone(),
        ));
        let intake = Mutex::new(IntakeFilter::new(config.intake.clone()));
        let context = Mutex::new(ConversationContext::new(config.intake.context_turns));

        Self {
            config,
            intake,
            context,
            engine,
            dispatcher,
            executor,
            events,
            shutdown: Notify::new(),
        }
    }

    /// Subscribe to the controller's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// The action executor backing this controller.
    pub fn executor(&self) -> Arc<ActionExecutor> {
        Arc::clone(&self.executor)
    }

    /// The dispatcher backing this controller.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Announce that the controller is up and receiving speech.
    pub fn start(&self) {
        info!(
            "Golem controller started on {}",
            self.config.general.network_interface
        );
        let _ = self.events.send(ControllerEvent::ControllerStarted {
            network_interface: self.config.general.network_interface.clone(),
            timestamp: Timestamp::now(),
        });
    }

    /// Consume speech events until the channel closes or `shutdown` is
    /// signalled.
    ///
    /// Handling failures are logged and the loop keeps going; a broken
    /// utterance must never take the controller down.
    pub async fn run(&self, mut events: mpsc::Receiver<SpeechEvent>) {
        info!("Controller loop running");
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Speech channel closed");
                        break;
                    };
                    if let Err(e) = self.handle_speech(&event).await {
                        error!("Speech handling failed: {}", e);
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("Shutdown signalled");
                    break;
                }
            }
        }
    }

    /// Signal the `run` loop to exit. Does not cancel running actions;
    /// callers follow up with `stop`.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Shut down: cancel all running actions and announce the stop.
    ///
    /// Returns how many actions were still running.
    pub fn stop(&self) -> Result<usize, DialogError> {
        let count = self.executor.cancel_all()?;
        let _ = self.events.send(ControllerEvent::AllActionsCancelled {
            count,
            timestamp: Timestamp::now(),
        });
        let _ = self.events.send(ControllerEvent::ControllerStopped {
            timestamp: Timestamp::now(),
        });
        info!("Golem controller stopped ({} actions cancelled)", count);
        Ok(count)
    }

    /// Feed one recognized-speech event through the pipeline.
    ///
    /// Returns `Ok(true)` when the utterance passed intake and a decision
    /// was dispatched, `Ok(false)` when intake dropped it.
    pub async fn handle_speech(&self, event: &SpeechEvent) -> Result<bool, DialogError> {
        let confidence = event.confidence.unwrap_or(0.0);

        let admitted = {
            let mut intake = self
                .intake
                .lock()
                .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
            intake.admit(&event.text, confidence)
        };

        match admitted {
            IntakeDecision::Rejected(reason) => {
                let _ = self.events.send(ControllerEvent::SpeechRejected {
                    reason,
                    confidence,
                    timestamp: Timestamp::now(),
                });
                Ok(false)
            }
            IntakeDecision::Accepted => {
                let text = event.text.trim();
                let _ = self.events.send(ControllerEvent::SpeechAccepted {
                    text_length: text.len(),
                    confidence,
                    timestamp: Timestamp::now(),
                });
                self.process_utterance(text).await
            }
        }
    }

    /// Run an accepted utterance through the engine and dispatch the result.
    async fn process_utterance(&self, text: &str) -> Result<bool, DialogError> {
        info!("User said: {}", text);

        // Record the turn and build the prompt in one critical section; the
        // guard must not be held across the engine call.
        let prompt = {
            let mut context = self
                .context
                .lock()
                .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
            context.add_user(text);
            context.build_prompt()
        };

        let decision = match self.engine.decide(text, &prompt).await {
            Ok(decision) => decision,
            Err(e) => {
                error!("Decision engine failed: {}", e);
                let _ = self.events.send(ControllerEvent::DecisionFailed {
                    reason: e.to_string(),
                    timestamp: Timestamp::now(),
                });
                let fallback = json!({ "text": FALLBACK_REPLY });
                return Ok(self.dispatcher.dispatch(&fallback).await);
            }
        };

        let reply = decision.get("text").and_then(Value::as_str).unwrap_or("");
        let has_action =
            decision.get("action").is_some() || decision.get("actions").is_some();
        let _ = self.events.send(ControllerEvent::DecisionReady {
            reply_length: reply.len(),
            has_action,
            timestamp: Timestamp::now(),
        });

        if !reply.is_empty() {
            let mut context = self
                .context
                .lock()
                .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
            context.add_robot(reply);
        }

        Ok(self.dispatcher.dispatch(&decision).await)
    }

    /// Request cancellation of a single running action.
    pub fn cancel_action(&self, id: &ActionId) -> Result<bool, DialogError> {
        let cancelled = self.executor.cancel(id)?;
        if cancelled {
            let _ = self.events.send(ControllerEvent::ActionCancelRequested {
                action_id: id.0,
                timestamp: Timestamp::now(),
            });
        }
        Ok(cancelled)
    }

    /// Request cancellation of every running action.
    pub fn cancel_all(&self) -> Result<usize, DialogError> {
        let count = self.executor.cancel_all()?;
        let _ = self.events.send(ControllerEvent::AllActionsCancelled {
            count,
            timestamp: Timestamp::now(),
        });
        Ok(count)
    }

    /// Halt the robot and sweep all running actions, bypassing the engine.
    pub async fn emergency_stop(&self) -> Result<bool, DialogError> {
        let success = self
            .executor
            .execute("system", "emergency_stop", &ActionPayload::empty())
            .await?;
        let _ = self.events.send(ControllerEvent::EmergencyStopTriggered {
            timestamp: Timestamp::now(),
        });
        Ok(success)
    }

    /// Replace the scene description given to the decision engine.
    pub fn set_scene(&self, scene: Value) -> Result<(), DialogError> {
        let mut context = self
            .context
            .lock()
            .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
        context.set_scene(scene);
        Ok(())
    }

    /// Replace the robot state snapshot given to the decision engine.
    pub fn set_robot_state(&self, state: Value) -> Result<(), DialogError> {
        let mut context = self
            .context
            .lock()
            .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
        context.set_robot_state(state);
        Ok(())
    }

    /// Advertised actions per class.
    pub fn available_actions(&self) -> Result<BTreeMap<String, Vec<String>>, DialogError> {
        Ok(self.executor.available_actions()?)
    }
}
