//! Common test utilities for hostconf integration tests
//!
//! Provides a package fixture backed by a temporary data directory.

#![allow(dead_code)]

use hostconf::{ConfigValue, PackageConfig, ServicePackage, StorageFormat, package};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A nodes manager package persisting into its own temp directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub package: ServicePackage,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_format(StorageFormat::Json)
    }

    pub fn with_format(format: StorageFormat) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let package = package::nodes_manager(config_in(&temp_dir, format))
            .expect("Failed to assemble package");
        Self { temp_dir, package }
    }

    /// Assemble a second package over the same data directory
    pub fn reopen(&self, format: StorageFormat) -> ServicePackage {
        package::nodes_manager(config_in(&self.temp_dir, format)).expect("Failed to reopen package")
    }

    pub fn state_path(&self, format: StorageFormat) -> PathBuf {
        self.temp_dir
            .path()
            .join(format!("config.{}", format.extension()))
    }
}

pub fn config_in(dir: &TempDir, format: StorageFormat) -> PackageConfig {
    package::default_config_builder()
        .data_dir(dir.path())
        .format(format)
        .service_host("127.0.0.1")
        .health_timeout(Duration::from_secs(2))
        .build()
}

/// A complete, valid configuration for the nodes manager
pub fn valid_config() -> Value {
    json!({
        "api-port": 8081,
        "ui-port": 5174,
        "supervisor-port": 9001,
        "admin-password": "Secr3t!Pass",
        "log-level": "debug",
        "enable-tor-proxy": false,
        "max-instances": 3,
        "advanced": {
            "tor-proxy-host": "10.0.0.2",
            "tor-proxy-port": 9150,
            "peer-discovery-interval": 30,
            "enable-libre-relay-detection": false,
            "artifact-cache-size": 0
        }
    })
}

/// `valid_config()` with one dotted path replaced
pub fn config_with(path: &str, value: Value) -> Value {
    let mut config = valid_config();
    let mut cursor = &mut config;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            cursor[part] = value;
            break;
        }
        cursor = &mut cursor[part];
    }
    config
}

/// `valid_config()` with one dotted path removed
pub fn config_without(path: &str) -> Value {
    let mut config = valid_config();
    let (parents, key) = match path.rsplit_once('.') {
        Some((parents, key)) => (Some(parents), key),
        None => (None, path),
    };
    let mut cursor = &mut config;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        cursor = &mut cursor[part];
    }
    cursor.as_object_mut().expect("parent is an object").remove(key);
    config
}

pub fn as_tree(value: &Value) -> ConfigValue {
    value.as_object().expect("config is an object").clone()
}
