//! Registry of known action names per class.
//!
//! The three built-in classes are seeded at startup; further entries can be
//! registered at runtime for discoverability of custom actions. The catalog
//! only describes actions, it never executes them.

use std::collections::BTreeMap;
use std::sync::RwLock;

use golem_core::error::GolemError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ActionError;
use crate::handler::{gesture, movement, system};

/// A named action and its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
}

/// Case-insensitive registry keyed by (class, name).
///
/// Entries within a class keep registration order; classes are listed
/// alphabetically. Registering an existing (class, name) pair overwrites its
/// description and never disturbs entries of other classes, even when names
/// collide across classes (`movement:stop` vs `system:stop`).
pub struct ActionCatalog {
    entries: RwLock<BTreeMap<String, Vec<CatalogEntry>>>,
}

impl ActionCatalog {
    /// An empty catalog with no classes.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// A catalog seeded with the built-in gesture, movement and system
    /// actions.
    pub fn with_builtins() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("gesture".to_string(), seed(gesture::GESTURES));
        entries.insert("movement".to_string(), seed(movement::MOVEMENTS));
        entries.insert("system".to_string(), seed(system::SYSTEM_COMMANDS));
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Add or overwrite the entry for (class, name).
    ///
    /// Observable immediately to any subsequent lookup.
    pub fn register(&self, class: &str, name: &str, description: &str) -> Result<(), ActionError> {
        let class = class.trim().to_lowercase();
        let name = name.trim().to_lowercase();
        let mut entries = self
            .entries
            .write()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
        let class_entries = entries.entry(class.clone()).or_default();
        match class_entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.description = description.to_string(),
            None => class_entries.push(CatalogEntry {
                name: name.clone(),
                description: description.to_string(),
            }),
        }
        info!("Registered catalog entry {}:{}", class, name);
        Ok(())
    }

    /// Action names known for a class, in registration order. Unknown classes
    /// list as empty.
    pub fn list(&self, class: &str) -> Result<Vec<String>, ActionError> {
        let class = class.trim().to_lowercase();
        let entries = self
            .entries
            .read()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(entries
            .get(&class)
            .map(|es| es.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default())
    }

    /// Full entries for a class, in registration order.
    pub fn entries(&self, class: &str) -> Result<Vec<CatalogEntry>, ActionError> {
        let class = class.trim().to_lowercase();
        let entries = self
            .entries
            .read()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(entries.get(&class).cloned().unwrap_or_default())
    }

    /// Every class with its action names, classes in alphabetical order.
    pub fn available(&self) -> Result<BTreeMap<String, Vec<String>>, ActionError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| GolemError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(entries
            .iter()
            .map(|(class, es)| (class.clone(), es.iter().map(|e| e.name.clone()).collect()))
            .collect())
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn seed(table: &[(&str, &str)]) -> Vec<CatalogEntry> {
    table
        .iter()
        .map(|(name, description)| CatalogEntry {
            name: name.to_string(),
            description: description.to_string(),
        })
        .collect()
}
