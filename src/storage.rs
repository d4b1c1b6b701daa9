//! Storage backend trait and implementations for persisted package state

use crate::config::ConfigValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;
use time::OffsetDateTime;

/// What the host keeps between calls: the last applied configuration and the
/// package version it was applied under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PersistedState {
    /// Package version the configuration was last applied under
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub config: ConfigValue,
}

impl PersistedState {
    pub fn new(version: impl Into<String>, config: ConfigValue) -> Self {
        Self {
            version: version.into(),
            updated_at: OffsetDateTime::now_utc(),
            config,
        }
    }
}

/// Trait for storage backend implementations
///
/// This allows the persisted state to be written as JSON or YAML.
pub trait StorageBackend: Send + Sync {
    /// File extension for this storage format (e.g., "json", "yaml")
    fn extension(&self) -> &str;

    /// Serialize data to string
    fn serialize(&self, data: &PersistedState) -> Result<String>;

    /// Deserialize data from string
    fn deserialize(&self, content: &str) -> Result<PersistedState>;

    /// Read and deserialize from file, `None` if the file does not exist yet
    fn read(&self, path: &Path) -> Result<Option<PersistedState>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.deserialize(&content).map(Some)
    }

    /// Serialize and write to file
    ///
    /// Uses atomic write: writes to temp file then renames to prevent corruption.
    /// The file is restricted to its owner before the rename since it may hold secrets.
    fn write(&self, path: &Path, data: &PersistedState) -> Result<()> {
        let content = self.serialize(data)?;

        if let Some(parent) = path.parent() {
            crate::security::ensure_secure_dir(parent)?;
        }

        let file_name = path.file_name().ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                path.display()
            ))
        })?;
        let mut temp_filename = file_name.to_os_string();
        temp_filename.push(".tmp");
        let temp_path = path.with_file_name(temp_filename);

        std::fs::write(&temp_path, &content).map_err(|e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;
        crate::security::set_secure_file_permissions(&temp_path)?;

        std::fs::rename(&temp_path, path).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Helper used by both backends
fn from_json_like<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))
}

// =============================================================================
// JSON Storage Implementation
// =============================================================================

/// JSON storage backend
#[derive(Clone, Default)]
pub struct JsonStorage {
    /// Pretty print JSON output
    pretty: bool,
}

impl JsonStorage {
    /// Create a new JSON storage backend with pretty printing enabled
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a compact JSON storage (no pretty printing)
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl StorageBackend for JsonStorage {
    fn extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, data: &PersistedState) -> Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(data).map_err(Error::from)
        } else {
            serde_json::to_string(data).map_err(Error::from)
        }
    }

    fn deserialize(&self, content: &str) -> Result<PersistedState> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        from_json_like(value)
    }
}

// =============================================================================
// YAML Storage Implementation
// =============================================================================

/// YAML storage backend, the format the host itself reads and writes
#[cfg(feature = "yaml")]
#[derive(Clone, Default)]
pub struct YamlStorage;

#[cfg(feature = "yaml")]
impl YamlStorage {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "yaml")]
impl StorageBackend for YamlStorage {
    fn extension(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, data: &PersistedState) -> Result<String> {
        serde_yaml::to_string(data).map_err(Error::from)
    }

    fn deserialize(&self, content: &str) -> Result<PersistedState> {
        // Go through a JSON value so numbers keep their integer/float distinction
        let value: serde_json::Value = serde_yaml::from_str(content)?;
        from_json_like(value)
    }
}

/// Storage format selector used by the configuration builder and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
}

impl Default for StorageFormat {
    #[cfg(feature = "yaml")]
    fn default() -> Self {
        StorageFormat::Yaml
    }

    #[cfg(not(feature = "yaml"))]
    fn default() -> Self {
        StorageFormat::Json
    }
}

impl StorageFormat {
    /// Instantiate the backend for this format
    pub fn backend(self) -> Box<dyn StorageBackend> {
        match self {
            StorageFormat::Json => Box::new(JsonStorage::new()),
            #[cfg(feature = "yaml")]
            StorageFormat::Yaml => Box::new(YamlStorage::new()),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            StorageFormat::Json => "json",
            #[cfg(feature = "yaml")]
            StorageFormat::Yaml => "yaml",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn state() -> PersistedState {
        let config = json!({"api-port": 8080, "log-level": "info", "advanced": {"tor-proxy-port": 9050}});
        PersistedState::new("0.1.0.1", config.as_object().unwrap().clone())
    }

    #[test]
    fn test_json_serialize_pretty() {
        let json = JsonStorage::new().serialize(&state()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"version\": \"0.1.0.1\""));
        assert!(json.contains("updated-at"));
    }

    #[test]
    fn test_json_serialize_compact() {
        let json = JsonStorage::compact().serialize(&state()).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_json_roundtrip_keeps_key_order() {
        let storage = JsonStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/config.json");

        let data = state();
        storage.write(&path, &data).unwrap();
        let loaded = storage.read(&path).unwrap().unwrap();

        assert_eq!(loaded.version, data.version);
        assert_eq!(loaded.config, data.config);
        let keys: Vec<_> = loaded.config.keys().cloned().collect();
        assert_eq!(keys, ["api-port", "log-level", "advanced"]);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_yaml_roundtrip() {
        let storage = YamlStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let data = state();
        storage.write(&path, &data).unwrap();
        let loaded = storage.read(&path).unwrap().unwrap();

        assert_eq!(loaded.config["api-port"], json!(8080));
        assert_eq!(loaded.config, data.config);
    }

    #[test]
    fn test_read_missing_file() {
        let result = JsonStorage::new()
            .read(Path::new("/nonexistent/config.json"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_read_corrupted_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(JsonStorage::new().read(&path).is_err());
    }
}
