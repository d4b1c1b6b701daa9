//! Error types for hostconf

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hostconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hostconf
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("Failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Contract Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("Invalid option definition for {key}: {reason}")]
    InvalidSchema { key: String, reason: String },

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Unknown procedure '{0}'")]
    UnknownProcedure(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error came from validating a candidate configuration
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this error came from the migration ledger
    #[must_use]
    pub fn is_migration_error(&self) -> bool {
        matches!(self, Error::Migration(_))
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Which rule a candidate value broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationErrorKind {
    /// Number outside its declared range
    Range,
    /// String does not match the declared pattern
    Pattern,
    /// Wrong JSON type, or a non-integral number for an integral option
    Type,
    /// Value is not one of the enum's declared values
    Enum,
    /// Object carries a key its nested schema does not declare
    UnknownKey,
    /// Required option is absent, null or an empty string
    MissingRequired,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Range => "range",
            Self::Pattern => "pattern",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::UnknownKey => "unknown-key",
            Self::MissingRequired => "missing-required",
        };
        f.write_str(name)
    }
}

/// A candidate value failed validation against the schema.
///
/// `path` is the dotted key path from the top of the configuration tree
/// (e.g. `advanced.tor-proxy-port`); it is empty when the root itself is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Invalid value at '{path}' ({kind}): {reason}")]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationErrorKind,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ValidationErrorKind, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Prefix the path with the key of the enclosing object
    #[must_use]
    pub fn nested_under(mut self, parent: &str) -> Self {
        self.path = if self.path.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.path)
        };
        self
    }
}

// =============================================================================
// Migration Errors
// =============================================================================

/// Why a migration could not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationErrorKind {
    /// A version is neither recorded in the ledger nor the current version
    UnknownVersion,
    /// A transform rejected its input, or the result did not fit the schema
    StepFailed,
}

/// A migration failed; nothing was applied.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Migration failed ({kind:?}){}: {detail}", at_boundary(.boundary))]
pub struct MigrationError {
    pub kind: MigrationErrorKind,
    pub detail: String,
    /// Version boundary of the failing step, as `from -> to`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<String>,
}

fn at_boundary(boundary: &Option<String>) -> String {
    boundary
        .as_ref()
        .map(|b| format!(" at {b}"))
        .unwrap_or_default()
}

impl MigrationError {
    pub fn unknown_version(version: impl fmt::Display) -> Self {
        Self {
            kind: MigrationErrorKind::UnknownVersion,
            detail: format!("version {version} is not recorded in the migration ledger"),
            boundary: None,
        }
    }

    pub fn step_failed(boundary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: MigrationErrorKind::StepFailed,
            detail: detail.into(),
            boundary: Some(boundary.into()),
        }
    }
}
