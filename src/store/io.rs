//! Loading and persisting store state

use super::ConfigStore;
use crate::config::ConfigValue;
use crate::error::Result;
use crate::storage::PersistedState;
use log::{debug, info, warn};
use serde_json::Value;

impl ConfigStore {
    /// Persisted configuration if it still fits the schema, otherwise defaults.
    ///
    /// Defaults are written out only when no state file exists at all, so a
    /// file the host might still migrate is never overwritten here.
    pub(super) fn load_or_defaults(&self) -> ConfigValue {
        let Some(persistence) = &self.persistence else {
            debug!("No persistence configured, installing defaults");
            return self.spec.default_value();
        };

        match persistence.backend.read(&persistence.path) {
            Ok(Some(state)) => match self.spec.validate(&Value::Object(state.config)) {
                Ok(config) => {
                    debug!(
                        "Loaded configuration written under version {} from {}",
                        state.version,
                        persistence.path.display()
                    );
                    config
                }
                Err(e) => {
                    warn!("Persisted configuration no longer fits the schema ({e}), using defaults");
                    self.spec.default_value()
                }
            },
            Ok(None) => {
                let defaults = self.spec.default_value();
                match self.persist(&self.version, &defaults) {
                    Ok(()) => info!("Installed default configuration at {}", persistence.path.display()),
                    Err(e) => warn!("Failed to persist default configuration: {e}"),
                }
                defaults
            }
            Err(e) => {
                warn!("Failed to read persisted configuration: {e}");
                self.spec.default_value()
            }
        }
    }

    /// Persisted configuration as stored, without validation
    pub(super) fn read_raw(&self) -> Result<Option<ConfigValue>> {
        match &self.persistence {
            Some(p) => Ok(p.backend.read(&p.path)?.map(|state| state.config)),
            None => Ok(None),
        }
    }

    /// Version recorded in the persisted state, if any
    pub fn stored_version(&self) -> Result<Option<String>> {
        match &self.persistence {
            Some(p) => Ok(p.backend.read(&p.path)?.map(|state| state.version)),
            None => Ok(None),
        }
    }

    /// Write `config` under `version`; a no-op for in-memory stores
    pub(super) fn persist(&self, version: &str, config: &ConfigValue) -> Result<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        let state = PersistedState::new(version, config.clone());
        persistence.backend.write(&persistence.path, &state)?;
        debug!("Persisted configuration to {}", persistence.path.display());
        Ok(())
    }
}
