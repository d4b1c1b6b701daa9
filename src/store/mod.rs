//! Configuration store
//!
//! This module contains the [`ConfigStore`], which holds the applied
//! configuration for a package and enforces the get/set contract:
//! reads never fail, writes are validated in full before anything changes.

mod io;

use crate::config::{ConfigSpec, ConfigValue, PackageConfig};
use crate::error::{MigrationError, Result};
use crate::events::{EventManager, SetConfigResult};
use crate::migration::MigrationLedger;
use crate::storage::StorageBackend;
use crate::sync::{MutexExt, RwLockExt};
use log::{debug, info};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

/// Where and how the store persists its state
struct Persistence {
    path: PathBuf,
    backend: Box<dyn StorageBackend>,
}

/// Holds the applied configuration of a package.
///
/// The value starts out unset. The first [`get`](Self::get) installs either
/// the persisted configuration or the schema defaults; from then on the store
/// always holds a complete, validated tree. Readers get an `Arc` snapshot and
/// never observe a partially applied change.
///
/// # Example
///
/// ```rust
/// use hostconf::{ConfigSpec, ConfigStore, OptionSpec};
/// use serde_json::json;
///
/// let spec = ConfigSpec::new()
///     .option(OptionSpec::number("max-instances", "Max Instances", 10).integral());
/// let store = ConfigStore::new(spec, "0.1.0.1");
///
/// assert_eq!(store.get()["max-instances"], json!(10));
///
/// let result = store.set(&json!({"max-instances": 25})).unwrap();
/// assert_eq!(result.signal, "SIGTERM");
/// assert_eq!(store.get()["max-instances"], json!(25));
///
/// assert!(store.set(&json!({"max-instances": "many"})).is_err());
/// assert_eq!(store.get()["max-instances"], json!(25));
/// ```
pub struct ConfigStore {
    spec: Arc<ConfigSpec>,

    /// Version written alongside every applied configuration
    version: String,

    /// `None` until the first read or write
    state: RwLock<Option<Arc<ConfigValue>>>,

    /// Serializes sets, migrations and lazy initialization
    save_lock: Mutex<()>,

    persistence: Option<Persistence>,

    events: EventManager,
}

impl ConfigStore {
    /// An in-memory store
    pub fn new(spec: impl Into<Arc<ConfigSpec>>, version: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            version: version.into(),
            state: RwLock::new(None),
            save_lock: Mutex::new(()),
            persistence: None,
            events: EventManager::new(),
        }
    }

    /// A store set up from a package configuration, persisting when a data
    /// directory is configured
    pub fn from_config(spec: impl Into<Arc<ConfigSpec>>, config: &PackageConfig) -> Self {
        let store = Self::new(spec, config.version.clone());
        match config.state_path() {
            Some(path) => store.with_storage(path, config.format.backend()),
            None => store,
        }
    }

    /// Persist state to `path` with the given backend
    #[must_use]
    pub fn with_storage(mut self, path: impl Into<PathBuf>, backend: Box<dyn StorageBackend>) -> Self {
        self.persistence = Some(Persistence {
            path: path.into(),
            backend,
        });
        self
    }

    pub fn spec(&self) -> &ConfigSpec {
        &self.spec
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Listeners notified after every applied change
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Current configuration: the last applied value, or the schema defaults.
    ///
    /// Never fails. A persisted state that cannot be read or no longer fits
    /// the schema is logged and replaced by defaults in memory.
    pub fn get(&self) -> Arc<ConfigValue> {
        if let Some(value) = self.state.read_recovered().as_ref() {
            return Arc::clone(value);
        }

        let _guard = self.save_lock.lock_recovered();
        // Another caller may have installed a value while we waited
        if let Some(value) = self.state.read_recovered().as_ref() {
            return Arc::clone(value);
        }

        let value = Arc::new(self.load_or_defaults());
        *self.state.write_recovered() = Some(Arc::clone(&value));
        value
    }

    /// Whether a configuration has been installed yet
    pub fn is_set(&self) -> bool {
        self.state.read_recovered().is_some()
    }

    /// Validate and apply a complete configuration.
    ///
    /// On success the new tree replaces the old one atomically and the advisory
    /// restart signal is returned. On a validation or storage failure nothing
    /// changes.
    pub fn set(&self, candidate: &Value) -> Result<SetConfigResult> {
        let validated = self.spec.validate(candidate)?;

        let _guard = self.save_lock.lock_recovered();
        self.persist(&self.version, &validated)?;

        let new = Arc::new(validated);
        let old = self.swap(Arc::clone(&new));
        info!("Configuration applied");

        self.events.notify(&old, &new);
        Ok(SetConfigResult::restart())
    }

    /// Run the ledger from `from` to `to` against the stored configuration.
    ///
    /// The source is the persisted state as written, falling back to the
    /// in-memory value only for stores without persistence. Holds the save
    /// lock for the whole run, so a concurrent set waits. When the migration
    /// ends at the ledger's current version, the result must validate against
    /// the schema (even for an empty plan) or the migration fails at its final
    /// boundary. Nothing is stored unless every step succeeds.
    pub fn migrate(&self, ledger: &MigrationLedger, from: &str, to: &str) -> Result<Arc<ConfigValue>> {
        let _guard = self.save_lock.lock_recovered();

        let plan = ledger.plan(from, to)?;
        // The file holds data written under `from`; the in-memory value may be
        // defaults installed because that data did not fit the current schema
        let source = match self.read_raw()? {
            Some(raw) => raw,
            None => match self.state.read_recovered().as_ref() {
                Some(value) => ConfigValue::clone(value),
                None => self.spec.default_value(),
            },
        };

        if plan.is_empty() {
            debug!("Migration {} -> {} has no steps", plan.from, plan.to);
        }
        let mut migrated = ledger.apply(&source, &plan)?;
        if plan.to == ledger.current() {
            let boundary = plan
                .steps
                .last()
                .map_or_else(|| format!("{} -> {}", plan.from, plan.to), |last| last.boundary());
            migrated = self
                .spec
                .validate(&Value::Object(migrated))
                .map_err(|e| {
                    MigrationError::step_failed(
                        boundary,
                        format!("migrated configuration does not fit the schema: {e}"),
                    )
                })?;
        }

        self.persist(&plan.to.to_string(), &migrated)?;
        let new = Arc::new(migrated);
        let old = self.swap(Arc::clone(&new));
        self.events.notify(&old, &new);
        Ok(new)
    }

    /// Replace the state, returning the previous value (empty if unset)
    fn swap(&self, new: Arc<ConfigValue>) -> Arc<ConfigValue> {
        self.state
            .write_recovered()
            .replace(new)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("version", &self.version)
            .field("options", &self.spec.len())
            .field("set", &self.is_set())
            .field("path", &self.persistence.as_ref().map(|p| &p.path))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
