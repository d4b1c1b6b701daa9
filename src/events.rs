//! Change notification and the advisory restart signal
//!
//! Listeners run synchronously after a configuration has been swapped in,
//! with the previous and new complete trees.

use crate::config::ConfigValue;
use crate::sync::RwLockExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Signal the host is asked to send after a configuration change
pub const RESTART_SIGNAL: &str = "SIGTERM";

/// Type alias for a change callback receiving (old, new)
pub type ChangeCallback = Arc<dyn Fn(&ConfigValue, &ConfigValue) + Send + Sync>;

/// Type alias for a callback watching a single top-level key
pub type KeyCallback = Arc<dyn Fn(&str, &serde_json::Value, &serde_json::Value) + Send + Sync>;

/// What a successful set tells the host.
///
/// The host decides whether and when to restart; this is a hint only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetConfigResult {
    pub signal: String,
    /// Package id to the list of reasons it must be reconfigured
    pub depends_on: BTreeMap<String, Vec<String>>,
}

impl SetConfigResult {
    /// The usual result: restart with SIGTERM, no dependencies affected
    pub fn restart() -> Self {
        Self {
            signal: RESTART_SIGNAL.to_string(),
            depends_on: BTreeMap::new(),
        }
    }
}

impl Default for SetConfigResult {
    fn default() -> Self {
        Self::restart()
    }
}

/// Manages listeners for configuration changes
#[derive(Default)]
pub struct EventManager {
    /// Called once per applied change with the full trees
    global_listeners: RwLock<Vec<ChangeCallback>>,

    /// Called only when the watched top-level key changed value
    key_listeners: RwLock<BTreeMap<String, Vec<KeyCallback>>>,
}

impl EventManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener called after every applied configuration
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&ConfigValue, &ConfigValue) + Send + Sync + 'static,
    {
        self.global_listeners.write_recovered().push(Arc::new(callback));
    }

    /// Register a listener for one top-level key (e.g. "ui-port")
    ///
    /// The callback receives (key, old value, new value) and fires only when
    /// the value actually differs.
    pub fn watch<F>(&self, key: &str, callback: F)
    where
        F: Fn(&str, &serde_json::Value, &serde_json::Value) + Send + Sync + 'static,
    {
        self.key_listeners
            .write_recovered()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Notify listeners about an applied change
    pub fn notify(&self, old: &ConfigValue, new: &ConfigValue) {
        // Clone the callbacks out so a listener may register another without deadlocking
        let global: Vec<ChangeCallback> = self.global_listeners.read_recovered().clone();
        for callback in &global {
            callback(old, new);
        }

        let keyed: Vec<(String, Vec<KeyCallback>)> = self
            .key_listeners
            .read_recovered()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, callbacks) in keyed {
            let before = old.get(&key).unwrap_or(&serde_json::Value::Null);
            let after = new.get(&key).unwrap_or(&serde_json::Value::Null);
            if before == after {
                continue;
            }
            for callback in &callbacks {
                callback(&key, before, after);
            }
        }
    }

    /// Remove all listeners for a specific key
    pub fn unwatch(&self, key: &str) {
        self.key_listeners.write_recovered().remove(key);
    }

    /// Clear all listeners
    pub fn clear(&self) {
        self.global_listeners.write_recovered().clear();
        self.key_listeners.write_recovered().clear();
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("global_listeners", &self.global_listeners.read_recovered().len())
            .field("key_listeners", &self.key_listeners.read_recovered().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
