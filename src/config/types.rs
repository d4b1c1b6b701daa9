//! Runtime configuration for a package instance

use crate::storage::StorageFormat;
use std::path::PathBuf;
use std::time::Duration;

/// Default budget for a single health probe
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time after start during which unreachable services report "starting"
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_secs(10);

/// Configuration for a [`ServicePackage`](crate::ServicePackage)
#[derive(Debug, Clone)]
pub struct PackageConfig {
    /// Package identifier (e.g. "garbageman-nm")
    pub package_id: String,

    /// Package version this build implements; the migration ledger's current version
    pub version: String,

    /// Directory for persisted state; `None` keeps state in memory only
    pub data_dir: Option<PathBuf>,

    /// File stem for the persisted state (extension comes from the format)
    pub state_file: String,

    /// Encoding of the persisted state
    pub format: StorageFormat,

    /// Hostname under which the host exposes the package's services
    pub service_host: String,

    /// Budget used when the host does not supply one
    pub health_timeout: Duration,

    /// Probes report "starting" instead of a failure while uptime is below this
    pub startup_grace: Duration,
}

impl PackageConfig {
    /// Create a new builder for `PackageConfig`
    ///
    /// # Example
    /// ```rust
    /// use hostconf::PackageConfig;
    ///
    /// let config = PackageConfig::builder("garbageman-nm", "0.1.0.1")
    ///     .data_dir("/tmp/garbageman-nm")
    ///     .build();
    /// assert_eq!(config.service_host, "garbageman-nm.embassy");
    /// ```
    pub fn builder(package_id: impl Into<String>, version: impl Into<String>) -> PackageConfigBuilder {
        PackageConfigBuilder::new(package_id, version)
    }

    /// Full path of the persisted state file, if persistence is enabled
    pub fn state_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| {
            dir.join(format!("{}.{}", self.state_file, self.format.extension()))
        })
    }
}

/// Builder for creating `PackageConfig` with a fluent API
#[derive(Debug, Clone)]
pub struct PackageConfigBuilder {
    package_id: String,
    version: String,
    data_dir: Option<PathBuf>,
    state_file: String,
    format: StorageFormat,
    service_host: Option<String>,
    health_timeout: Duration,
    startup_grace: Duration,
}

impl PackageConfigBuilder {
    /// Create a new builder with required package id and version
    pub fn new(package_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            version: version.into(),
            data_dir: None,
            state_file: "config".into(),
            format: StorageFormat::default(),
            service_host: None,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            startup_grace: DEFAULT_STARTUP_GRACE,
        }
    }

    /// Persist state under this directory
    ///
    /// Supports `~` expansion for home directory.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path,
        };
        self.data_dir = Some(expanded);
        self
    }

    /// Set the state file stem (default: "config")
    pub fn state_file(mut self, stem: impl Into<String>) -> Self {
        self.state_file = stem.into();
        self
    }

    pub fn format(mut self, format: StorageFormat) -> Self {
        self.format = format;
        self
    }

    /// Override the service hostname (default: `{package_id}.embassy`)
    pub fn service_host(mut self, host: impl Into<String>) -> Self {
        self.service_host = Some(host.into());
        self
    }

    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// Build the `PackageConfig`
    pub fn build(self) -> PackageConfig {
        let service_host = self
            .service_host
            .unwrap_or_else(|| format!("{}.embassy", self.package_id));

        PackageConfig {
            package_id: self.package_id,
            version: self.version,
            data_dir: self.data_dir,
            state_file: self.state_file,
            format: self.format,
            service_host,
            health_timeout: self.health_timeout,
            startup_grace: self.startup_grace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let config = PackageConfig::builder("test-pkg", "0.1.0").build();

        assert_eq!(config.package_id, "test-pkg");
        assert_eq!(config.version, "0.1.0");
        assert_eq!(config.service_host, "test-pkg.embassy");
        assert_eq!(config.health_timeout, DEFAULT_HEALTH_TIMEOUT);
        assert!(config.state_path().is_none());
    }

    #[test]
    fn test_builder_with_options() {
        let config = PackageConfig::builder("pkg", "1.0.0")
            .data_dir("/tmp/pkg")
            .state_file("state")
            .format(StorageFormat::Json)
            .service_host("localhost")
            .health_timeout(Duration::from_millis(500))
            .build();

        assert_eq!(config.state_path(), Some(PathBuf::from("/tmp/pkg/state.json")));
        assert_eq!(config.service_host, "localhost");
        assert_eq!(config.health_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_home_expansion() {
        let config = PackageConfig::builder("pkg", "1.0.0").data_dir("~/pkg").build();
        let dir = config.data_dir.unwrap();
        if dirs::home_dir().is_some() {
            assert!(!dir.starts_with("~"));
            assert!(dir.ends_with("pkg"));
        }
    }
}
