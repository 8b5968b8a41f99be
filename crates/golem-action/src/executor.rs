//! Action execution engine.
//!
//! Resolves action classes to handlers (custom registrations shadow the
//! built-ins), runs actions on the caller or on a spawned task, and keeps
//! the running table and history consistent through [`ActionStore`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use golem_core::config::MotionConfig;
use golem_core::events::ControllerEvent;
use golem_core::types::{ActionId, CancelToken, Timestamp};
use golem_core::GolemError;
use golem_motion::Motion;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::catalog::ActionCatalog;
use crate::error::ActionError;
use crate::handler::{
    ActionHandler, GestureHandler, MovementHandler, ResolvedHandler, SystemHandler,
};
use crate::store::ActionStore;
use crate::types::{ActionClass, ActionPayload, ActionRecord, ExecutionMode, RunningAction};

/// The action execution engine.
///
/// One instance per controller. Cheap to share behind an `Arc`; all methods
/// take `&self`.
pub struct ActionExecutor {
    catalog: Arc<ActionCatalog>,
    gesture: Arc<GestureHandler>,
    movement: Arc<MovementHandler>,
    system: Arc<SystemHandler>,
    custom: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
    store: Arc<ActionStore>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ActionExecutor {
    /// Create an executor wired to the given motion backend.
    ///
    /// Submission and completion of asynchronous actions are announced on
    /// `events`; a send with no live subscribers is not an error.
    pub fn new(
        motion: Arc<dyn Motion>,
        motion_config: MotionConfig,
        events: broadcast::Sender<ControllerEvent>,
    ) -> Self {
        let store = Arc::new(ActionStore::new());
        let gesture = Arc::new(GestureHandler::new(Arc::clone(&motion)));
        let movement = Arc::new(MovementHandler::new(Arc::clone(&motion), motion_config));
        let system = Arc::new(SystemHandler::new(motion, Arc::clone(&store)));
        Self {
            catalog: Arc::new(ActionCatalog::with_builtins()),
            gesture,
            movement,
            system,
            custom: RwLock::new(HashMap::new()),
            store,
            events,
        }
    }

    /// The running/history store backing this executor.
    pub fn store(&self) -> Arc<ActionStore> {
        Arc::clone(&self.store)
    }

    /// The action catalog backing this executor.
    pub fn catalog(&self) -> Arc<ActionCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Register a handler for a custom action class.
    ///
    /// The class is matched case-insensitively. A custom handler shadows the
    /// built-in of the same class; registering again replaces the previous
    /// handler. Catalog visibility is separate: register entries through
    /// [`ActionCatalog::register`] if the class should be advertised.
    pub fn register_handler(
        &self,
        class: &str,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), ActionError> {
        let class = class.trim().to_lowercase();
        let mut custom = self
            .custom
            .write()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
        info!("Registered custom action handler: {}", class);
        custom.insert(class, handler);
        Ok(())
    }

    /// Resolve a normalized class name to a handler, custom first.
    fn resolve(&self, class: &str) -> Result<Option<ResolvedHandler>, ActionError> {
        {
            let custom = self
                .custom
                .read()
                .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
            if let Some(handler) = custom.get(class) {
                return Ok(Some(ResolvedHandler::Custom(Arc::clone(handler))));
            }
        }
        match class.parse::<ActionClass>() {
            Ok(ActionClass::Gesture) => Ok(Some(ResolvedHandler::Gesture(Arc::clone(&self.gesture)))),
            Ok(ActionClass::Movement) => {
                Ok(Some(ResolvedHandler::Movement(Arc::clone(&self.movement))))
            }
            Ok(ActionClass::System) => Ok(Some(ResolvedHandler::System(Arc::clone(&self.system)))),
            Err(_) => Ok(None),
        }
    }

    /// Execute an action on the caller, waiting for it to finish.
    ///
    /// Returns the handler's outcome. A missing handler is recorded as a
    /// failed attempt and reported as [`ActionError::UnregisteredHandler`];
    /// handler faults are logged and recorded, never propagated.
    pub async fn execute(
        &self,
        class: &str,
        name: &str,
        payload: &ActionPayload,
    ) -> Result<bool, ActionError> {
        let class = class.trim().to_lowercase();
        let Some(handler) = self.resolve(&class)? else {
            error!("No handler for action class: {}", class);
            self.store.record(ActionRecord {
                class: class.clone(),
                name: name.to_string(),
                success: false,
                mode: ExecutionMode::Sync,
                id: None,
                executed_at: Timestamp::now(),
            })?;
            return Err(ActionError::UnregisteredHandler(class));
        };

        // Nothing holds this token while the caller waits, so a synchronous
        // run can only be stopped by the handler itself.
        let token = CancelToken::new();
        let success = match handler.run(name, payload, &token).await {
            Ok(done) => done,
            Err(e) => {
                error!("Action handler error: {}", e);
                false
            }
        };
        self.store.record(ActionRecord {
            class,
            name: name.to_string(),
            success,
            mode: ExecutionMode::Sync,
            id: None,
            executed_at: Timestamp::now(),
        })?;
        Ok(success)
    }

    /// Submit an action to run on its own task and return its id.
    ///
    /// The running entry is inserted before the task is spawned, so the id
    /// is cancellable as soon as this returns. Completion removes the entry
    /// and appends the history record in one step.
    pub fn execute_async(
        &self,
        class: &str,
        name: &str,
        payload: ActionPayload,
    ) -> Result<ActionId, ActionError> {
        let class = class.trim().to_lowercase();
        let Some(handler) = self.resolve(&class)? else {
            error!("No handler for action class: {}", class);
            self.store.record(ActionRecord {
                class: class.clone(),
                name: name.to_string(),
                success: false,
                mode: ExecutionMode::Async,
                id: None,
                executed_at: Timestamp::now(),
            })?;
            return Err(ActionError::UnregisteredHandler(class));
        };

        let id = ActionId::new();
        let token = CancelToken::new();
        self.store.insert_running(
            id.0,
            RunningAction {
                class: class.clone(),
                name: name.to_string(),
                token: token.clone(),
                started_at: Timestamp::now(),
            },
        )?;
        let _ = self.events.send(ControllerEvent::ActionSubmitted {
            action_id: id.0,
            class: class.clone(),
            name: name.to_string(),
            timestamp: Timestamp::now(),
        });

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let name = name.to_string();
        let raw_id = id.0;
        tokio::spawn(async move {
            let success = match handler.run(&name, &payload, &token).await {
                Ok(done) => done,
                Err(e) => {
                    error!("Action handler error: {}", e);
                    false
                }
            };
            let record = ActionRecord {
                class: class.clone(),
                name: name.clone(),
                success,
                mode: ExecutionMode::Async,
                id: Some(raw_id),
                executed_at: Timestamp::now(),
            };
            if let Err(e) = store.finish(raw_id, record) {
                error!("Failed to record finished action: {}", e);
            }
            let _ = events.send(ControllerEvent::ActionCompleted {
                action_id: raw_id,
                class,
                name,
                success,
                timestamp: Timestamp::now(),
            });
        });

        Ok(id)
    }

    /// Run a list of action objects in order, waiting for each.
    ///
    /// Elements that are not objects or carry no name are skipped with a
    /// log line; a missing class defaults to `gesture`. Returns how many
    /// actions completed successfully.
    pub async fn execute_sequence(&self, actions: &[Value]) -> usize {
        let mut successful = 0;
        for (index, action) in actions.iter().enumerate() {
            let Some(object) = action.as_object() else {
                error!("Invalid action at index {}: {}", index, action);
                continue;
            };
            let class = object.get("type").and_then(|v| v.as_str()).unwrap_or("gesture");
            let Some(name) = object
                .get("name")
                .or_else(|| object.get("action"))
                .and_then(|v| v.as_str())
            else {
                error!("Invalid action at index {}: missing name", index);
                continue;
            };
            let payload = ActionPayload::from_object(object, &["type", "name", "action"]);
            match self.execute(class, name, &payload).await {
                Ok(true) => successful += 1,
                Ok(false) => {}
                Err(e) => error!("Action failed: {}", e),
            }
        }
        info!(
            "Action sequence completed: {}/{} successful",
            successful,
            actions.len()
        );
        successful
    }

    /// Request cancellation of one running action.
    ///
    /// Returns whether a running action with that id existed. Cancellation
    /// is a request: the action's history record appears once its task
    /// observes the token and finishes.
    pub fn cancel(&self, id: &ActionId) -> Result<bool, ActionError> {
        self.store.cancel(id.0)
    }

    /// Request cancellation of every running action, returning how many
    /// were signalled.
    pub fn cancel_all(&self) -> Result<usize, ActionError> {
        self.store.cancel_all()
    }

    /// Catalog of advertised actions per class.
    pub fn available_actions(&self) -> Result<BTreeMap<String, Vec<String>>, ActionError> {
        self.catalog.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use golem_motion::SimulatedMotion;
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

    fn make_executor() -> ActionExecutor {
        let config = fast_config();
        let motion: Arc<dyn Motion> = Arc::new(SimulatedMotion::new(config.clone()));
        let (events, _) = broadcast::channel(64);
        ActionExecutor::new(motion, config, events)
    }

    async fn wait_settled(store: &ActionStore) {
        for _ in 0..400 {
            if store.running_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("running actions did not settle in time");
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

    struct ExplodingHandler;

    #[async_trait]
    impl ActionHandler for ExplodingHandler {
        async fn run(
            &self,
            _name: &str,
            _payload: &ActionPayload,
            _token: &CancelToken,
        ) -> Result<bool, ActionError> {
            Err(ActionError::HandlerFailed("boom".to_string()))
        }
    }

    // ---- resolution tests ----

    #[tokio::test]
    async fn test_every_catalog_entry_resolves_and_runs() {
        let executor = make_executor();
        for (class, names) in executor.available_actions().unwrap() {
            for name in names {
                let result = executor.execute(&class, &name, &ActionPayload::empty()).await;
                assert!(result.is_ok(), "{}:{} should resolve", class, name);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_class_is_recorded_and_refused() {
        let executor = make_executor();
        let result = executor.execute("dance", "moonwalk", &ActionPayload::empty()).await;
        assert!(matches!(result, Err(ActionError::UnregisteredHandler(_))));

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].class, "dance");
        assert_eq!(history[0].name, "moonwalk");
        assert!(!history[0].success);
        assert_eq!(history[0].mode, ExecutionMode::Sync);
        assert!(history[0].id.is_none());
    }

    #[tokio::test]
    async fn test_unknown_class_async_is_recorded_and_refused() {
        let executor = make_executor();
        let result = executor.execute_async("dance", "moonwalk", ActionPayload::empty());
        assert!(matches!(result, Err(ActionError::UnregisteredHandler(_))));

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].mode, ExecutionMode::Async);
        assert!(history[0].id.is_none());
        assert_eq!(executor.store().running_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_handler_shadows_builtin() {
        let executor = make_executor();
        let echo = Arc::new(EchoHandler::default());
        executor
            .register_handler("gesture", Arc::clone(&echo) as Arc<dyn ActionHandler>)
            .unwrap();

        let done = executor.execute("gesture", "wave", &ActionPayload::empty()).await.unwrap();
        assert!(done);
        assert_eq!(*echo.calls.lock().unwrap(), vec!["wave"]);
    }

    #[tokio::test]
    async fn test_custom_class_registers_and_executes() {
        let executor = make_executor();
        let echo = Arc::new(EchoHandler::default());
        executor
            .register_handler("Dance", Arc::clone(&echo) as Arc<dyn ActionHandler>)
            .unwrap();

        // Lookup is case-insensitive on both sides.
        let done = executor.execute("DANCE", "moonwalk", &ActionPayload::empty()).await.unwrap();
        assert!(done);
        assert_eq!(*echo.calls.lock().unwrap(), vec!["moonwalk"]);

        // Handler registration alone does not advertise the class.
        assert!(!executor.available_actions().unwrap().contains_key("dance"));
    }

    // ---- synchronous execution tests ----

    #[tokio::test]
    async fn test_sync_execution_records_once() {
        let executor = make_executor();
        let done = executor.execute("gesture", "wave", &ActionPayload::empty()).await.unwrap();
        assert!(done);

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].class, "gesture");
        assert_eq!(history[0].name, "wave");
        assert!(history[0].success);
        assert_eq!(history[0].mode, ExecutionMode::Sync);
        assert!(history[0].id.is_none());
    }

    #[tokio::test]
    async fn test_handler_fault_becomes_failed_record() {
        let executor = make_executor();
        executor
            .register_handler("gesture", Arc::new(ExplodingHandler) as Arc<dyn ActionHandler>)
            .unwrap();

        let done = executor.execute("gesture", "wave", &ActionPayload::empty()).await.unwrap();
        assert!(!done);

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
    }

    #[tokio::test]
    async fn test_refused_action_is_recorded_as_failure() {
        let executor = make_executor();
        let done = executor
            .execute("gesture", "pirouette", &ActionPayload::empty())
            .await
            .unwrap();
        assert!(!done);

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
    }

    // ---- asynchronous execution tests ----

    #[tokio::test]
    async fn test_async_ids_are_unique() {
        let executor = make_executor();
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(executor.execute_async("gesture", "wave", ActionPayload::empty()).unwrap());
        }
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a.0, b.0);
            }
        }
        wait_settled(&executor.store()).await;
    }

    #[tokio::test]
    async fn test_async_completion_records_exactly_once() {
        let executor = make_executor();
        let id = executor.execute_async("gesture", "nod", ActionPayload::empty()).unwrap();
        assert!(executor.store().is_running(id.0));

        wait_settled(&executor.store()).await;

        assert!(!executor.store().is_running(id.0));
        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "nod");
        assert!(history[0].success);
        assert_eq!(history[0].mode, ExecutionMode::Async);
        assert_eq!(history[0].id, Some(id.0));
    }

    // ---- cancellation tests ----

    #[tokio::test]
    async fn test_cancel_unknown_id_reports_noop() {
        let executor = make_executor();
        assert!(!executor.cancel(&ActionId::new()).unwrap());
    }

    #[tokio::test]
    async fn test_cancel_finished_action_reports_noop() {
        let executor = make_executor();
        let id = executor.execute_async("gesture", "wave", ActionPayload::empty()).unwrap();
        wait_settled(&executor.store()).await;
        assert!(!executor.cancel(&id).unwrap());
    }

    #[tokio::test]
    async fn test_cancel_running_action_ends_in_failed_record() {
        let executor = make_executor();
        // 60 m at 1 m/s keeps the walk busy until the token lands.
        let payload = ActionPayload { data: json!({"distance": 60.0}) };
        let id = executor.execute_async("movement", "forward", payload).unwrap();

        assert!(executor.cancel(&id).unwrap());
        wait_settled(&executor.store()).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].success);
        assert_eq!(history[0].id, Some(id.0));
    }

    #[tokio::test]
    async fn test_cancel_all_when_idle_reports_zero() {
        let executor = make_executor();
        assert_eq!(executor.cancel_all().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_sweeps_every_running_action() {
        let executor = make_executor();
        let payload = ActionPayload { data: json!({"distance": 60.0}) };
        executor.execute_async("movement", "forward", payload.clone()).unwrap();
        executor.execute_async("movement", "forward", payload).unwrap();

        assert_eq!(executor.cancel_all().unwrap(), 2);
        wait_settled(&executor.store()).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| !r.success));
    }

    // ---- sequence tests ----

    #[tokio::test]
    async fn test_sequence_counts_only_successes() {
        let executor = make_executor();
        let actions = vec![
            json!({"type": "gesture", "name": "wave"}),
            json!("not an object"),
            json!({"type": "gesture"}),
            json!({"name": "pirouette"}),
            json!({"type": "system", "action": "sit_down"}),
        ];
        let successful = executor.execute_sequence(&actions).await;
        assert_eq!(successful, 2);

        // Skipped elements leave no trace; refused ones are recorded.
        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn test_sequence_defaults_missing_class_to_gesture() {
        let executor = make_executor();
        let actions = vec![json!({"name": "wave"})];
        assert_eq!(executor.execute_sequence(&actions).await, 1);

        let history = executor.store().history().unwrap();
        assert_eq!(history[0].class, "gesture");
    }

    #[tokio::test]
    async fn test_sequence_runs_in_submission_order() {
        let executor = make_executor();
        let echo = Arc::new(EchoHandler::default());
        executor
            .register_handler("gesture", Arc::clone(&echo) as Arc<dyn ActionHandler>)
            .unwrap();

        let actions = vec![
            json!({"name": "wave"}),
            json!({"name": "nod"}),
            json!({"name": "bow"}),
        ];
        assert_eq!(executor.execute_sequence(&actions).await, 3);
        assert_eq!(*echo.calls.lock().unwrap(), vec!["wave", "nod", "bow"]);
    }

    // ---- event tests ----

    #[tokio::test]
    async fn test_async_lifecycle_is_announced() {
        let config = fast_config();
        let motion: Arc<dyn Motion> = Arc::new(SimulatedMotion::new(config.clone()));
        let (events, mut rx) = broadcast::channel(64);
        let executor = ActionExecutor::new(motion, config, events);

        let id = executor.execute_async("gesture", "wave", ActionPayload::empty()).unwrap();
        wait_settled(&executor.store()).await;

        let submitted = rx.recv().await.unwrap();
        match submitted {
            ControllerEvent::ActionSubmitted { action_id, class, name, .. } => {
                assert_eq!(action_id, id.0);
                assert_eq!(class, "gesture");
                assert_eq!(name, "wave");
            }
            other => panic!("expected ActionSubmitted, got {:?}", other),
        }
        let completed = rx.recv().await.unwrap();
        match completed {
            ControllerEvent::ActionCompleted { action_id, success, .. } => {
                assert_eq!(action_id, id.0);
                assert!(success);
            }
            other => panic!("expected ActionCompleted, got {:?}", other),
        }
    }

    // ---- emergency stop tests ----

    #[tokio::test]
    async fn test_emergency_stop_sweeps_running_actions() {
        let executor = make_executor();
        let payload = ActionPayload { data: json!({"distance": 60.0}) };
        let id = executor.execute_async("movement", "forward", payload).unwrap();

        let done = executor
            .execute("system", "emergency_stop", &ActionPayload::empty())
            .await
            .unwrap();
        assert!(done);
        wait_settled(&executor.store()).await;

        let history = executor.store().history().unwrap();
        assert_eq!(history.len(), 2);
        let walk = history.iter().find(|r| r.id == Some(id.0)).unwrap();
        assert!(!walk.success);
        let stop = history.iter().find(|r| r.name == "emergency_stop").unwrap();
        assert!(stop.success);
        assert_eq!(stop.mode, ExecutionMode::Sync);
    }
}
