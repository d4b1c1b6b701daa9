//! The hooks a host invokes on a package
//!
//! [`Procedures`] is the inbound interface; [`ServicePackage`] implements it
//! over a schema, a store, a ledger and a probe registry. [`dispatch`] routes
//! a procedure name and JSON input to the right hook for callers that only
//! have strings, like the command-line entry point.

use crate::config::{ConfigSpec, ConfigValue, DisplaySchema, PackageConfig};
use crate::error::{Error, Result};
use crate::events::SetConfigResult;
use crate::health::{HealthRegistry, HealthResult, ProbeContext};
use crate::migration::{MigrationLedger, Version};
use crate::properties::{self, PropertiesDocument};
use crate::store::ConfigStore;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// What get-config hands back: the schema, its rendering, and the raw value
#[derive(Debug, Clone, Serialize)]
pub struct GetConfigResult {
    pub spec: ConfigSpec,
    pub display: DisplaySchema,
    pub config: ConfigValue,
}

/// Outcome of a successful migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub from: String,
    pub to: String,
    /// The stored configuration is valid for the current version
    pub configured: bool,
}

/// Lifecycle hooks of a managed package
#[async_trait]
pub trait Procedures: Send + Sync {
    fn describe_schema(&self) -> &ConfigSpec;

    fn get_config(&self) -> GetConfigResult;

    fn set_config(&self, candidate: &Value) -> Result<SetConfigResult>;

    fn properties(&self) -> PropertiesDocument;

    async fn health(&self, name: &str, budget: Duration) -> HealthResult;

    fn migration(&self, from: &str, to: &str) -> Result<MigrationOutcome>;
}

/// A package wired together from its parts
pub struct ServicePackage {
    config: PackageConfig,
    store: ConfigStore,
    ledger: MigrationLedger,
    health: HealthRegistry,
    started_at: Option<Instant>,
}

impl ServicePackage {
    /// Assemble a package, rejecting a malformed schema or a ledger whose
    /// current version differs from the package version.
    pub fn new(
        config: PackageConfig,
        spec: ConfigSpec,
        ledger: MigrationLedger,
        health: HealthRegistry,
    ) -> Result<Self> {
        spec.validate_schema()?;

        let version = Version::parse(&config.version)?;
        if ledger.current() != version {
            return Err(Error::Config(format!(
                "migration ledger is at {} but the package version is {version}",
                ledger.current()
            )));
        }

        let store = ConfigStore::from_config(spec, &config);
        info!(
            "Package '{}' {} ready ({} option(s), {} health check(s))",
            config.package_id,
            config.version,
            store.spec().len(),
            health.len()
        );

        Ok(Self {
            config,
            store,
            ledger,
            health,
            started_at: None,
        })
    }

    /// Record when the service started, enabling probe startup grace
    #[must_use]
    pub fn started_at(mut self, instant: Instant) -> Self {
        self.started_at = Some(instant);
        self
    }

    pub fn config(&self) -> &PackageConfig {
        &self.config
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    pub fn health_checks(&self) -> &HealthRegistry {
        &self.health
    }

    fn probe_context(&self) -> ProbeContext {
        let ctx = ProbeContext::new(self.store.get());
        match self.started_at {
            Some(start) => ctx.with_uptime(start.elapsed()),
            None => ctx,
        }
    }

    /// Run every probe with the configured default budget
    pub async fn health_all(&self) -> Vec<(String, HealthResult)> {
        self.health
            .run_all(self.config.health_timeout, self.probe_context())
            .await
    }
}

#[async_trait]
impl Procedures for ServicePackage {
    fn describe_schema(&self) -> &ConfigSpec {
        self.store.spec()
    }

    fn get_config(&self) -> GetConfigResult {
        let config = self.store.get();
        GetConfigResult {
            spec: self.store.spec().clone(),
            display: self.store.spec().render_with_values(&config),
            config: ConfigValue::clone(&config),
        }
    }

    fn set_config(&self, candidate: &Value) -> Result<SetConfigResult> {
        self.store.set(candidate)
    }

    fn properties(&self) -> PropertiesDocument {
        properties::render(self.store.spec(), &self.store.get())
    }

    async fn health(&self, name: &str, budget: Duration) -> HealthResult {
        self.health.run(name, budget, self.probe_context()).await
    }

    fn migration(&self, from: &str, to: &str) -> Result<MigrationOutcome> {
        self.store.migrate(&self.ledger, from, to)?;
        let configured = Version::parse(to)? == self.ledger.current();
        Ok(MigrationOutcome {
            from: from.to_string(),
            to: to.to_string(),
            configured,
        })
    }
}

impl std::fmt::Debug for ServicePackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePackage")
            .field("package_id", &self.config.package_id)
            .field("version", &self.config.version)
            .field("store", &self.store)
            .field("ledger", &self.ledger)
            .field("health", &self.health)
            .finish()
    }
}

// =============================================================================
// Name-based dispatch
// =============================================================================

/// Procedure names accepted by [`dispatch`]
pub const PROCEDURE_NAMES: [&str; 6] = [
    "describe-schema",
    "get-config",
    "set-config",
    "properties",
    "health",
    "migration",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HealthInput {
    name: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MigrationInput {
    from: String,
    to: String,
}

fn input<T: serde::de::DeserializeOwned>(procedure: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| Error::Parse(format!("invalid input for '{procedure}': {e}")))
}

/// Invoke a procedure by name with JSON input, returning JSON output.
///
/// `health` takes `{"name": ..., "timeout-ms": ...}` and falls back to
/// `default_budget` when no timeout is given; `migration` takes
/// `{"from": ..., "to": ...}`; `set-config` takes the candidate tree itself.
pub async fn dispatch(
    procedures: &dyn Procedures,
    name: &str,
    payload: &Value,
    default_budget: Duration,
) -> Result<Value> {
    debug!("Dispatching procedure '{name}'");
    let output = match name {
        "describe-schema" => serde_json::to_value(procedures.describe_schema())?,
        "get-config" => serde_json::to_value(procedures.get_config())?,
        "set-config" => serde_json::to_value(procedures.set_config(payload)?)?,
        "properties" => serde_json::to_value(procedures.properties())?,
        "health" => {
            let args: HealthInput = input(name, payload)?;
            let budget = args
                .timeout_ms
                .map_or(default_budget, Duration::from_millis);
            serde_json::to_value(procedures.health(&args.name, budget).await)?
        }
        "migration" => {
            let args: MigrationInput = input(name, payload)?;
            serde_json::to_value(procedures.migration(&args.from, &args.to)?)?
        }
        other => return Err(Error::UnknownProcedure(other.to_string())),
    };
    Ok(output)
}
