//! The Garbageman nodes manager package
//!
//! Web UI, API server and multi-daemon supervisor for Bitcoin node
//! instances. This module declares its schema, its (empty) migration
//! ledger, and its health probes.

use crate::config::{ConfigSpec, NumberRange, OptionSpec, PackageConfig, PackageConfigBuilder};
use crate::error::Result;
use crate::health::{HealthRegistry, TcpProbe, WebUrlProbe};
use crate::migration::MigrationLedger;
use crate::procedures::ServicePackage;

pub const PACKAGE_ID: &str = "garbageman-nm";

/// Version this build implements
pub const PACKAGE_VERSION: &str = "0.1.0.1";

/// Characters accepted in the admin password
pub const ADMIN_PASSWORD_PATTERN: &str = "[a-zA-Z0-9!@#$%^&*]+";

fn port(key: &str, name: &str, default: u16) -> OptionSpec {
    OptionSpec::number(key, name, default)
        .range(NumberRange::closed(1024.0, 65535.0))
        .integral()
}

/// The package's configuration schema
pub fn config_spec() -> ConfigSpec {
    ConfigSpec::new()
        .option(
            port("api-port", "API Port", 8080)
                .description("Internal port for the API server")
                .warning(
                    "Changing this port requires a service restart. Ensure it doesn't conflict \
                     with other services on your device.",
                ),
        )
        .option(
            port("ui-port", "UI Port", 5173)
                .description("Internal port for the web UI")
                .warning(
                    "This is the internal port. External access is via Tor hidden service on \
                     port 80. Changing this requires a service restart.",
                ),
        )
        .option(
            port("supervisor-port", "Supervisor Port", 9000)
                .description("Internal port for the multi-daemon supervisor")
                .warning(
                    "The supervisor manages all Bitcoin daemon instances. Changing this port \
                     requires a service restart.",
                ),
        )
        .option(
            OptionSpec::password("admin-password", "Admin Password")
                .description(
                    "Secure password for API access. This will be used for future \
                     authentication features. Store this securely.",
                )
                .pattern(
                    ADMIN_PASSWORD_PATTERN,
                    "Must contain letters, numbers, and special characters",
                )
                .warning(
                    "Changing the password does not retroactively invalidate existing sessions. \
                     For security, restart the service after changing this value.",
                ),
        )
        .option(
            OptionSpec::enumeration(
                "log-level",
                "Log Level",
                "info",
                [
                    ("debug", "Debug (Very Verbose)"),
                    ("info", "Info (Recommended)"),
                    ("warn", "Warnings Only"),
                    ("error", "Errors Only"),
                ],
            )
            .description("Logging verbosity for all services (API, UI, Supervisor)"),
        )
        .option(
            OptionSpec::boolean("enable-tor-proxy", "Enable Tor Proxy", true)
                .description(
                    "Enable internal Tor SOCKS5 proxy for discovering .onion Bitcoin peers. \
                     Disabling this limits peer discovery to clearnet DNS seeds only.",
                )
                .warning(
                    "Disabling Tor reduces privacy and limits peer discovery to clearnet nodes.",
                ),
        )
        .option(
            OptionSpec::number("max-instances", "Maximum Instances", 10)
                .range(NumberRange::closed(1.0, 50.0))
                .integral()
                .units("instances")
                .description(
                    "Maximum number of concurrent Bitcoin daemon instances allowed. Each \
                     instance requires ~10 GB RAM + 500 GB disk.",
                )
                .warning(
                    "Running many instances simultaneously requires significant resources. \
                     Monitor RAM and disk usage carefully.",
                ),
        )
        .option(
            OptionSpec::object("advanced", "Advanced Settings", advanced_spec())
                .description("Advanced configuration options for power users"),
        )
}

fn advanced_spec() -> ConfigSpec {
    ConfigSpec::new()
        .option(
            OptionSpec::string("tor-proxy-host", "Tor Proxy Host", "127.0.0.1")
                .placeholder("127.0.0.1")
                .description(
                    "Hostname or IP address of the Tor SOCKS5 proxy. Leave default unless \
                     using an external Tor service.",
                ),
        )
        .option(
            port("tor-proxy-port", "Tor Proxy Port", 9050)
                .description("Port for the Tor SOCKS5 proxy"),
        )
        .option(
            OptionSpec::number("peer-discovery-interval", "Peer Discovery Interval", 60)
                .range(NumberRange::closed(5.0, 1440.0))
                .integral()
                .units("minutes")
                .description("How often to refresh the peer discovery list"),
        )
        .option(
            OptionSpec::boolean(
                "enable-libre-relay-detection",
                "Enable Libre Relay Detection",
                true,
            )
            .description("Automatically detect and tag Libre Relay nodes during peer discovery"),
        )
        .option(
            OptionSpec::number("artifact-cache-size", "Artifact Cache Size", 5)
                .range(NumberRange::closed(0.0, 100.0))
                .integral()
                .units("artifacts")
                .description(
                    "Maximum number of imported artifacts to keep cached. Set to 0 for unlimited.",
                )
                .warning("Artifacts can be very large (1-10 GB each). Monitor disk space carefully."),
        )
}

/// No migrations have been recorded yet
pub fn ledger(current: &str) -> Result<MigrationLedger> {
    MigrationLedger::new(current)
}

/// Probes for the web UI, API server and supervisor
pub fn health_checks(config: &PackageConfig) -> HealthRegistry {
    let host = config.service_host.as_str();
    let mut registry = HealthRegistry::new();
    registry
        .register(
            "web-ui",
            WebUrlProbe::new(host, "ui-port", 5173).startup_grace(config.startup_grace),
        )
        .register(
            "api-server",
            TcpProbe::new(host, "api-port", 8080)
                .label("API server")
                .startup_grace(config.startup_grace),
        )
        .register(
            "supervisor",
            TcpProbe::new(host, "supervisor-port", 9000)
                .label("supervisor")
                .startup_grace(config.startup_grace),
        );
    registry
}

/// Builder preset with the package id and version
pub fn default_config_builder() -> PackageConfigBuilder {
    PackageConfig::builder(PACKAGE_ID, PACKAGE_VERSION)
}

/// In-memory package configuration with default settings
pub fn default_config() -> PackageConfig {
    default_config_builder().build()
}

/// Assemble the complete package
pub fn nodes_manager(config: PackageConfig) -> Result<ServicePackage> {
    let ledger = ledger(&config.version)?;
    let health = health_checks(&config);
    ServicePackage::new(config, config_spec(), ledger, health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::DEFAULT_PASSWORD_LENGTH;
    use serde_json::{Value, json};

    #[test]
    fn test_schema_is_well_formed() {
        config_spec().validate_schema().unwrap();
    }

    #[test]
    fn test_defaults() {
        let spec = config_spec();
        let defaults = spec.default_value();

        assert_eq!(defaults["api-port"], json!(8080));
        assert_eq!(defaults["ui-port"], json!(5173));
        assert_eq!(defaults["supervisor-port"], json!(9000));
        assert_eq!(defaults["log-level"], json!("info"));
        assert_eq!(defaults["enable-tor-proxy"], json!(true));
        assert_eq!(defaults["max-instances"], json!(10));
        assert_eq!(defaults["advanced"]["tor-proxy-port"], json!(9050));
        assert_eq!(defaults["advanced"]["artifact-cache-size"], json!(5));

        let password = defaults["admin-password"].as_str().unwrap();
        assert_eq!(password.len(), DEFAULT_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        spec.validate(&Value::Object(defaults)).unwrap();
    }

    #[test]
    fn test_top_level_order() {
        let keys: Vec<_> = config_spec().options().iter().map(|o| o.key.clone()).collect();
        assert_eq!(
            keys,
            [
                "api-port",
                "ui-port",
                "supervisor-port",
                "admin-password",
                "log-level",
                "enable-tor-proxy",
                "max-instances",
                "advanced"
            ]
        );
    }

    #[test]
    fn test_health_check_names() {
        let registry = health_checks(&default_config());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["web-ui", "api-server", "supervisor"]);
    }

    #[test]
    fn test_empty_ledger_at_package_version() {
        let ledger = ledger(PACKAGE_VERSION).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.current().to_string(), PACKAGE_VERSION);
    }
}
