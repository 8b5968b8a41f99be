//! Decision dispatch.
//!
//! Takes the decision object produced by the engine and fans it out in a
//! fixed order: speak the reply, start the primary action, then start each
//! entry of the `actions` list. Speech runs on its own task so a slow
//! synthesizer never delays the robot's movements.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use golem_action::{ActionError, ActionExecutor, ActionHandler, ActionPayload};
use golem_core::events::ControllerEvent;
use golem_core::types::{CancelToken, Timestamp};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::error::DialogError;
use crate::speech::SpeechSink;

/// Decision keys that carry routing metadata rather than action parameters.
const DECISION_KEYS: &[&str] = &["text", "action", "action_type", "actions", "status", "timestamp"];

/// Keys consumed when routing one entry of the `actions` list.
const SEQUENCE_KEYS: &[&str] = &["type", "name", "action"];

/// Routes decision objects to the speech sink and the action executor.
pub struct Dispatcher {
    executor: Arc<ActionExecutor>,
    speech: Arc<dyn SpeechSink>,
    custom: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
    speaker_id: u32,
    events: broadcast::Sender<ControllerEvent>,
}

impl Dispatcher {
    pub fn new(
        executor: Arc<ActionExecutor>,
        speech: Arc<dyn SpeechSink>,
        speaker_id: u32,
        events: broadcast::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            executor,
            speech,
            custom: RwLock::new(HashMap::new()),
            speaker_id,
            events,
        }
    }

    /// Register a dispatch-level handler for an action class.
    ///
    /// Dispatch handlers are consulted before the executor and run inline on
    /// the dispatching task, so they suit short callbacks such as UI updates.
    /// Real actions that should be tracked and cancellable belong in
    /// [`ActionExecutor::register_handler`].
    pub fn register_handler(
        &self,
        class: &str,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), DialogError> {
        let class = class.trim().to_lowercase();
        let mut custom = self
            .custom
            .write()
            .map_err(|e| DialogError::Storage(format!("Lock poisoned: {}", e)))?;
        info!("Registered dispatch handler: {}", class);
        custom.insert(class, handler);
        Ok(())
    }

    /// Apply one decision object.
    ///
    /// Returns `false` only when the decision is not a JSON object. Failures
    /// of individual actions are logged and recorded in history; they never
    /// fail the dispatch as a whole.
    pub async fn dispatch(&self, decision: &Value) -> bool {
        let Some(object) = decision.as_object() else {
            error!("Invalid decision object: {}", decision);
            return false;
        };

        if let Some(text) = object.get("text").and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                self.spawn_speech(text.to_string());
            }
        }

        if let Some(name) = object.get("action").and_then(Value::as_str) {
            let class = object
                .get("action_type")
                .and_then(Value::as_str)
                .unwrap_or("gesture");
            let payload = ActionPayload::from_object(object, DECISION_KEYS);
            self.route(class, name, payload).await;
        }

        if let Some(actions) = object.get("actions").and_then(Value::as_array) {
            for entry in actions {
                let Some(item) = entry.as_object() else {
                    continue;
                };
                let class = item.get("type").and_then(Value::as_str).unwrap_or("gesture");
                let name = item
                    .get("name")
                    .or_else(|| item.get("action"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let payload = ActionPayload::from_object(item, SEQUENCE_KEYS);
                self.route(class, name, payload).await;
            }
        }

        true
    }

    /// Route one action, preferring a dispatch handler over the executor.
    async fn route(&self, class: &str, name: &str, payload: ActionPayload) -> bool {
        let class = class.trim().to_lowercase();

        let handler = match self.custom.read() {
            Ok(custom) => custom.get(&class).cloned(),
            Err(e) => {
                error!("Lock poisoned: {}", e);
                return false;
            }
        };
        if let Some(handler) = handler {
            let token = CancelToken::new();
            return match handler.run(name, &payload, &token).await {
                Ok(success) => success,
                Err(e) => {
                    error!("Dispatch handler error: {}", e);
                    false
                }
            };
        }

        match self.executor.execute_async(&class, name, payload) {
            Ok(id) => {
                info!("Started async action {}:{} (id={})", class, name, id.0);
                true
            }
            Err(ActionError::UnregisteredHandler(class)) => {
                warn!("No handler found for action type: {}", class);
                false
            }
            Err(e) => {
                error!("Failed to start action {}:{}: {}", class, name, e);
                false
            }
        }
    }

    fn spawn_speech(&self, text: String) {
        let speech = Arc::clone(&self.speech);
        let events = self.events.clone();
        let speaker_id = self.speaker_id;
        tokio::spawn(async move {
            match speech.say(&text, speaker_id).await {
                Ok(()) => {
                    let _ = events.send(ControllerEvent::UtteranceSpoken {
                        text_length: text.len(),
                        speaker_id,
                        timestamp: Timestamp::now(),
                    });
                }
                Err(e) => error!("Failed to speak reply: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use golem_core::config::MotionConfig;
    use golem_motion::{Motion, SimulatedMotion};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn fast_config() -> MotionConfig {
        MotionConfig {
            default_distance_m: 0.05,
            default_speed_mps: 1.0,
            default_turn_deg: 90.0,
            turn_speed_dps: 9000.0,
            gesture_duration_secs: 0.01,
            step_interval_ms: 5,
        }
    }

    #[derive(Default)]
    struct RecordingSpeech {
        utterances: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl SpeechSink for RecordingSpeech {
        async fn say(&self, text: &str, speaker_id: u32) -> Result<(), DialogError> {
            self.utterances.lock().unwrap().push((text.to_string(), speaker_id));
            Ok(())
        }
    }

    #[derive(Default)]
    struct EchoHandler {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActionHandler for EchoHandler {
        async fn run(
            &self,
            name: &str,
            _payload: &ActionPayload,
            _token: &CancelToken,
        ) -> Result<bool, ActionError> {
            self.calls.lock().unwrap().push(name.to_string());
            Ok(true)
        }
    }

    fn make_dispatcher() -> (Dispatcher, Arc<ActionExecutor>, Arc<RecordingSpeech>) {
        let config = fast_config();
        let motion: Arc<dyn Motion> = Arc::new(SimulatedMotion::new(config.clone()));
        let (events, _) = broadcast::channel(64);
        let executor = Arc::new(ActionExecutor::new(motion, config, events.clone()));
        let speech = Arc::new(RecordingSpeech::default());
        let dispatcher = Dispatcher::new(Arc::clone(&executor), speech.clone(), 1, events);
        (dispatcher, executor, speech)
    }

    async fn wait_spoken(speech: &RecordingSpeech, count: usize) {
        for _ in 0..400 {
            if speech.utterances.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("speech did not arrive in time");
    }

    async fn wait_settled(executor: &ActionExecutor) {
        for _ in 0..400 {
            if executor.store().running_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("running actions did not settle in time");
    }

    async fn wait_history(executor: &ActionExecutor, count: usize) {
        for _ in 0..400 {
            if executor.store().history().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("history did not fill in time");
    }

    // ---- structure tests ----

    #[tokio::test]
    async fn test_non_object_decision_is_refused() {
        let (dispatcher, executor, speech) = make_dispatcher();

        assert!(!dispatcher.dispatch(&json!("just words")).await);
        assert!(!dispatcher.dispatch(&json!(42)).await);
        assert!(!dispatcher.dispatch(&json!([{"action": "wave"}])).await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(executor.store().history().unwrap().is_empty());
        assert!(speech.utterances.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_object_is_handled() {
        let (dispatcher, executor, _speech) = make_dispatcher();
        assert!(dispatcher.dispatch(&json!({})).await);
        assert!(executor.store().history().unwrap().is_empty());
    }

    // ---- speech tests ----

    #[tokio::test]
    async fn test_text_only_decision_speaks() {
        let (dispatcher, executor, speech) = make_dispatcher();

        assert!(dispatcher.dispatch(&json!({"text": "Hello there!"})).await);
        wait_spoken(&speech, 1).await;

        let utterances = speech.utterances.lock().unwrap();
        assert_eq!(utterances.as_slice(), &[("Hello there!".to_string(), 1)]);
        assert!(executor.store().history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_reply_is_not_spoken() {
        let (dispatcher, _executor, speech) = make_dispatcher();

        assert!(dispatcher.dispatch(&json!({"text": "   "})).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(speech.utterances.lock().unwrap().is_empty());
    }

    // ---- routing tests ----

    #[tokio::test]
    async fn test_reply_with_gesture_speaks_and_waves() {
        let (dispatcher, executor, speech) = make_dispatcher();

        let decision = json!({
            "text": "Hello there!",
            "action": "wave",
            "action_type": "gesture",
            "status": "success",
        });
        assert!(dispatcher.dispatch(&decision).await);

        wait_spoken(&speech, 1).await;
        wait_history(&executor, 1).await;
        wait_settled(&executor).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].class, "gesture");
        assert_eq!(history[0].name, "wave");
        assert!(history[0].success);
    }

    #[tokio::test]
    async fn test_primary_action_defaults_to_gesture_class() {
        let (dispatcher, executor, _speech) = make_dispatcher();

        assert!(dispatcher.dispatch(&json!({"action": "nod"})).await);
        wait_history(&executor, 1).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history[0].class, "gesture");
        assert_eq!(history[0].name, "nod");
    }

    #[tokio::test]
    async fn test_unknown_class_is_recorded_not_fatal() {
        let (dispatcher, executor, _speech) = make_dispatcher();

        let decision = json!({"action": "moonwalk", "action_type": "dance"});
        assert!(dispatcher.dispatch(&decision).await);

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].class, "dance");
        assert!(!history[0].success);
    }

    #[tokio::test]
    async fn test_dispatch_handler_checked_before_executor() {
        let (dispatcher, executor, _speech) = make_dispatcher();
        let handler = Arc::new(EchoHandler::default());
        dispatcher.register_handler("Gesture", handler.clone()).unwrap();

        assert!(dispatcher.dispatch(&json!({"action": "wave"})).await);

        assert_eq!(handler.calls.lock().unwrap().as_slice(), &["wave".to_string()]);
        assert!(executor.store().history().unwrap().is_empty());
    }

    // ---- actions list tests ----

    #[tokio::test]
    async fn test_secondary_actions_run_in_order() {
        let (dispatcher, _executor, _speech) = make_dispatcher();
        let handler = Arc::new(EchoHandler::default());
        dispatcher.register_handler("seq", handler.clone()).unwrap();

        let decision = json!({
            "actions": [
                {"type": "seq", "name": "first"},
                {"type": "seq", "action": "second"},
                {"type": "seq", "name": "third"},
            ],
        });
        assert!(dispatcher.dispatch(&decision).await);

        let calls = handler.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[tokio::test]
    async fn test_malformed_list_entries_are_skipped() {
        let (dispatcher, executor, _speech) = make_dispatcher();

        let decision = json!({
            "actions": [
                "not an object",
                {"type": "gesture", "name": "wave"},
                {"type": "gesture"},
            ],
        });
        assert!(dispatcher.dispatch(&decision).await);

        // The nameless entry still reaches the gesture handler and is
        // refused there, so two records land in history.
        wait_history(&executor, 2).await;
        wait_settled(&executor).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 2);
        let wave = history.iter().find(|r| r.name == "wave").unwrap();
        assert!(wave.success);
        let nameless = history.iter().find(|r| r.name.is_empty()).unwrap();
        assert!(!nameless.success);
    }

    #[tokio::test]
    async fn test_primary_runs_before_secondaries() {
        let (dispatcher, _executor, _speech) = make_dispatcher();
        let handler = Arc::new(EchoHandler::default());
        dispatcher.register_handler("seq", handler.clone()).unwrap();

        let decision = json!({
            "action": "primary",
            "action_type": "seq",
            "actions": [{"type": "seq", "name": "secondary"}],
        });
        assert!(dispatcher.dispatch(&decision).await);

        let calls = handler.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &["primary".to_string(), "secondary".to_string()]);
    }

    #[tokio::test]
    async fn test_movement_then_emergency_stop_sweeps() {
        let (dispatcher, executor, _speech) = make_dispatcher();

        let decision = json!({
            "actions": [
                {"type": "movement", "name": "forward", "distance": 60.0},
                {"type": "system", "name": "emergency_stop"},
            ],
        });
        assert!(dispatcher.dispatch(&decision).await);
        wait_settled(&executor).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 2);
        let walk = history.iter().find(|r| r.name == "forward").unwrap();
        assert!(!walk.success, "the sweep should have cancelled the walk");
        let halt = history.iter().find(|r| r.name == "emergency_stop").unwrap();
        assert!(halt.success);
    }

    // ---- event tests ----

    #[tokio::test]
    async fn test_spoken_reply_is_announced() {
        let config = fast_config();
        let motion: Arc<dyn Motion> = Arc::new(SimulatedMotion::new(config.clone()));
        let (events, mut rx) = broadcast::channel(64);
        let executor = Arc::new(ActionExecutor::new(motion, config, events.clone()));
        let speech = Arc::new(RecordingSpeech::default());
        let dispatcher = Dispatcher::new(executor, speech.clone(), 7, events);

        assert!(dispatcher.dispatch(&json!({"text": "All set."})).await);
        wait_spoken(&speech, 1).await;

        let event = rx.recv().await.unwrap();
        match event {
            ControllerEvent::UtteranceSpoken { text_length, speaker_id, .. } => {
                assert_eq!(text_length, "All set.".len());
                assert_eq!(speaker_id, 7);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
