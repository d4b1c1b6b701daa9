//! # hostconf - Service Package Integration Contract
//!
//! Everything a managed application package hands to the service host that
//! runs it: a typed configuration schema, validated get/set of the applied
//! configuration, named health probes, a read-only properties view, and a
//! versioned migration ledger.
//!
//! ## Features
//!
//! - **Option Types**: number, string, boolean, enum and nested object options with ranges, patterns and closed value sets
//! - **Schema Rendering**: the schema merged with current values, sensitive values masked
//! - **Configuration Store**: all-or-nothing set with an advisory restart signal, lock-free snapshots for readers
//! - **Health Checks**: tri-state probes bounded by a time budget, never raising
//! - **Migrations**: upgrade/downgrade plans over a version ledger, applied atomically
//! - **Persistence**: JSON or YAML state files written atomically with owner-only permissions
//!
//! ## Quick Start
//!
//! ```rust
//! use hostconf::{ConfigSpec, ConfigStore, NumberRange, OptionSpec, ValidationErrorKind};
//! use serde_json::json;
//!
//! let spec = ConfigSpec::new()
//!     .option(OptionSpec::number("api-port", "API Port", 8080)
//!         .range(NumberRange::closed(1024.0, 65535.0))
//!         .integral())
//!     .option(OptionSpec::password("admin-password", "Admin Password"));
//!
//! let store = ConfigStore::new(spec, "0.1.0.1");
//!
//! // Out of range: rejected, nothing changes
//! let err = store
//!     .set(&json!({"api-port": 70000, "admin-password": "s3cret"}))
//!     .unwrap_err();
//! match err {
//!     hostconf::Error::Validation(e) => assert_eq!(e.kind, ValidationErrorKind::Range),
//!     other => panic!("{other}"),
//! }
//!
//! store.set(&json!({"api-port": 8081, "admin-password": "s3cret"})).unwrap();
//! assert_eq!(store.get()["api-port"], json!(8081));
//! ```
//!
//! ## The Nodes Manager Package
//!
//! ```rust
//! use hostconf::{Procedures, package};
//!
//! let pkg = package::nodes_manager(package::default_config()).unwrap();
//! let props = pkg.properties();
//! assert_eq!(props.version, 2);
//! assert!(props.data.get("Admin Password").unwrap().is_masked());
//! ```

// Core modules
mod docs;
mod error;
mod events;
mod procedures;
mod secrets;
mod security;
mod store;
mod sync;

// Grouped modules
pub mod config;
pub mod health;
pub mod migration;
pub mod package;
pub mod properties;
pub mod storage;

// Re-exports from core
pub use docs::{DocsConfig, generate_docs};
pub use error::{
    Error, MigrationError, MigrationErrorKind, Result, ValidationError, ValidationErrorKind,
};
pub use events::{ChangeCallback, EventManager, RESTART_SIGNAL, SetConfigResult};
pub use procedures::{
    GetConfigResult, MigrationOutcome, PROCEDURE_NAMES, Procedures, ServicePackage, dispatch,
};
pub use secrets::{DEFAULT_PASSWORD_LENGTH, MASKED_PLACEHOLDER, generate_password, mask};
pub use store::ConfigStore;

// Re-exports from grouped modules
pub use config::{
    ConfigSpec, ConfigValue, DisplayOption, DisplaySchema, NumberRange, OptionKind, OptionSpec,
    PackageConfig, PackageConfigBuilder,
};
pub use health::{HealthRegistry, HealthResult, Probe, ProbeContext};
pub use migration::{MigrationLedger, MigrationPlan, Version};
pub use properties::PropertiesDocument;
pub use storage::{JsonStorage, PersistedState, StorageBackend, StorageFormat};
