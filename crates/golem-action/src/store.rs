//! Shared table of in-flight actions and the execution history.
//!
//! One mutex guards both collections. An async action's history append and
//! its removal from the running set happen under a single acquisition, so a
//! cancel can never observe an action that is both finished and running, and
//! an entry can never be removed twice.

use std::collections::HashMap;
use std::sync::Mutex;

use golem_core::error::GolemError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ActionError;
use crate::types::{ActionRecord, RunningAction};

#[derive(Default)]
struct StoreInner {
    running: HashMap<Uuid, RunningAction>,
    history: Vec<ActionRecord>,
}

/// Concurrency-safe store for the running-action set and the history log.
pub struct ActionStore {
    inner: Mutex<StoreInner>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>, ActionError> {
        self.inner
            .lock()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)).into())
    }

    /// Insert the running record for a freshly minted id.
    ///
    /// Must happen before the action's task is spawned, so a cancel issued
    /// right after submission always finds the entry.
    pub fn insert_running(&self, id: Uuid, action: RunningAction) -> Result<(), ActionError> {
        let mut inner = self.lock()?;
        inner.running.insert(id, action);
        Ok(())
    }

    /// Append the final record and drop the running entry in one step.
    pub fn finish(&self, id: Uuid, record: ActionRecord) -> Result<(), ActionError> {
        let mut inner = self.lock()?;
        inner.history.push(record);
        inner.running.remove(&id);
        Ok(())
    }

    /// Append a history record for a synchronous or refused execution.
    pub fn record(&self, record: ActionRecord) -> Result<(), ActionError> {
        let mut inner = self.lock()?;
        inner.history.push(record);
        Ok(())
    }

    /// Signal cancellation for a single running action.
    ///
    /// Returns false when the id is unknown, which covers actions that
    /// already finished. That is a no-op report, not an error.
    pub fn cancel(&self, id: Uuid) -> Result<bool, ActionError> {
        let inner = self.lock()?;
        match inner.running.get(&id) {
            Some(action) => {
                action.token.cancel();
                Ok(true)
            }
            None => {
                warn!("No running action with id: {}", id);
                Ok(false)
            }
        }
    }

    /// Signal cancellation for every running action.
    ///
    /// The id set is snapshotted first so the lock is not held while
    /// signalling; actions submitted after the snapshot are untouched.
    pub fn cancel_all(&self) -> Result<usize, ActionError> {
        let ids: Vec<Uuid> = {
            let inner = self.lock()?;
            inner.running.keys().copied().collect()
        };
        let mut cancelled = 0;
        for id in ids {
            if self.cancel(id)? {
                cancelled += 1;
            }
        }
        info!("Cancelled {} running actions", cancelled);
        Ok(cancelled)
    }

    pub fn running_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.running.len()).unwrap_or(0)
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.running.contains_key(&id))
            .unwrap_or(false)
    }

    /// Snapshot of the execution history, oldest first.
    pub fn history(&self) -> Result<Vec<ActionRecord>, ActionError> {
        let inner = self.lock()?;
        Ok(inner.history.clone())
    }
}

impl Default for ActionStore {
    fn default() -> Self {
        Self::new()
    }
}
