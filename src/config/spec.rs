//! Ordered option collections and their rendered display form

use crate::config::schema::{OptionKind, OptionSpec, validate_object};
use crate::error::{Error, Result, ValidationError};
use crate::secrets::mask;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A configuration value tree: option key to value, in declaration order
pub type ConfigValue = Map<String, Value>;

// =============================================================================
// ConfigSpec
// =============================================================================

/// Ordered collection of options.
///
/// Declaration order is display order and is kept through serialization, so
/// a spec serialized to the host and read back lists its options the same way.
///
/// # Example
///
/// ```rust
/// use hostconf::{ConfigSpec, NumberRange, OptionSpec};
/// use serde_json::json;
///
/// let spec = ConfigSpec::new()
///     .option(OptionSpec::number("api-port", "API Port", 8080)
///         .range(NumberRange::closed(1024.0, 65535.0))
///         .integral())
///     .option(OptionSpec::boolean("enable-tor-proxy", "Enable Tor Proxy", true));
///
/// let defaults = spec.default_value();
/// assert_eq!(defaults["api-port"], json!(8080));
/// assert!(spec.validate(&json!({"api-port": 9000, "enable-tor-proxy": false})).is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSpec {
    options: Vec<OptionSpec>,
}

impl ConfigSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option
    #[must_use]
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn get(&self, key: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Look up an option by dotted path (`advanced.tor-proxy-port`)
    pub fn lookup(&self, path: &str) -> Option<&OptionSpec> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let option = self.get(head)?;
        match (rest, &option.kind) {
            (None, _) => Some(option),
            (Some(rest), OptionKind::Object(o)) => o.spec.lookup(rest),
            (Some(_), _) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Full value tree built from every option's default
    pub fn default_value(&self) -> ConfigValue {
        self.options
            .iter()
            .map(|o| (o.key.clone(), o.default_value()))
            .collect()
    }

    /// Validate a complete candidate tree.
    ///
    /// Returns the normalized tree in declaration order, or the first error
    /// encountered with its full key path.
    pub fn validate(&self, candidate: &Value) -> std::result::Result<ConfigValue, ValidationError> {
        validate_object(&self.options, candidate)
    }

    /// Validate the option definitions themselves, recursively.
    ///
    /// Fails on duplicate keys within a level, or any option whose constraints
    /// are malformed or whose default does not satisfy them.
    pub fn validate_schema(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.key.as_str()) {
                return Err(Error::InvalidSchema {
                    key: option.key.clone(),
                    reason: "duplicate key".to_string(),
                });
            }
            option
                .validate_schema()
                .map_err(|reason| Error::InvalidSchema {
                    key: option.key.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Merge current values into the option list for presentation.
    ///
    /// Options keep declaration order. Sensitive values and defaults are masked.
    /// Keys missing from `value` render their default.
    pub fn render_with_values(&self, value: &ConfigValue) -> DisplaySchema {
        DisplaySchema {
            options: self
                .options
                .iter()
                .map(|o| render_option(o, value.get(&o.key)))
                .collect(),
        }
    }
}

fn render_option(option: &OptionSpec, value: Option<&Value>) -> DisplayOption {
    let current = value.cloned().unwrap_or_else(|| option.default_value());
    let sensitive = option.is_sensitive();

    let (units, choices, children) = match &option.kind {
        OptionKind::Number(n) => (n.units.clone(), Vec::new(), Vec::new()),
        OptionKind::Enum(e) => (
            None,
            e.values
                .iter()
                .map(|v| DisplayChoice {
                    value: v.clone(),
                    label: e.label(v).to_string(),
                })
                .collect(),
            Vec::new(),
        ),
        OptionKind::Object(o) => {
            let nested = current.as_object().cloned().unwrap_or_default();
            (None, Vec::new(), o.spec.render_with_values(&nested).options)
        }
        OptionKind::String(_) | OptionKind::Boolean(_) => (None, Vec::new(), Vec::new()),
    };

    let (value, default) = match (&option.kind, sensitive) {
        (OptionKind::Object(_), _) => (Value::Null, Value::Null),
        (_, true) => (mask(&current), mask(&option.default_value())),
        (_, false) => (current, option.default_value()),
    };

    DisplayOption {
        key: option.key.clone(),
        name: option.name.clone(),
        kind: option.kind.name(),
        description: option.description.clone(),
        warning: option.warning.clone(),
        required: option.is_required(),
        masked: sensitive,
        units,
        choices,
        value,
        default,
        children,
    }
}

impl Serialize for ConfigSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.options.len()))?;
        for option in &self.options {
            map.serialize_entry(&option.key, option)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfigSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut options = Vec::with_capacity(raw.len());
        for (key, body) in raw {
            let mut option: OptionSpec = serde_json::from_value(body)
                .map_err(|e| de::Error::custom(format!("option '{key}': {e}")))?;
            option.key = key;
            options.push(option);
        }
        Ok(Self { options })
    }
}

// =============================================================================
// Display schema
// =============================================================================

/// Options merged with current values, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySchema {
    pub options: Vec<DisplayOption>,
}

impl DisplaySchema {
    /// Find a rendered option by dotted path
    pub fn find(&self, path: &str) -> Option<&DisplayOption> {
        find_in(&self.options, path)
    }
}

fn find_in<'a>(options: &'a [DisplayOption], path: &str) -> Option<&'a DisplayOption> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let option = options.iter().find(|o| o.key == head)?;
    match rest {
        None => Some(option),
        Some(rest) => find_in(&option.children, rest),
    }
}

/// One rendered option
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayOption {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub required: bool,
    pub masked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<DisplayChoice>,
    /// Current value, masked when sensitive; `null` for objects
    pub value: Value,
    /// Default value, masked when sensitive; `null` for objects
    pub default: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayOption>,
}

/// An enum value with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayChoice {
    pub value: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::range::NumberRange;
    use crate::error::ValidationErrorKind;
    use crate::secrets::MASKED_PLACEHOLDER;
    use serde_json::json;

    fn spec() -> ConfigSpec {
        ConfigSpec::new()
            .option(
                OptionSpec::number("ui-port", "UI Port", 5173)
                    .range(NumberRange::closed(1024.0, 65535.0))
                    .integral(),
            )
            .option(OptionSpec::password("admin-password", "Admin Password"))
            .option(OptionSpec::enumeration(
                "log-level",
                "Log Level",
                "info",
                [("debug", "Debug"), ("info", "Info")],
            ))
            .option(OptionSpec::object(
                "advanced",
                "Advanced",
                ConfigSpec::new()
                    .option(OptionSpec::string("tor-proxy-host", "Tor Proxy Host", "127.0.0.1"))
                    .option(OptionSpec::string("token", "Token", "abc").masked()),
            ))
    }

    #[test]
    fn test_defaults_validate() {
        let spec = spec();
        spec.validate_schema().unwrap();
        let defaults = Value::Object(spec.default_value());
        assert_eq!(spec.validate(&defaults).unwrap(), spec.default_value());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let spec = ConfigSpec::new()
            .option(OptionSpec::boolean("a", "A", true))
            .option(OptionSpec::boolean("a", "A again", false));
        let err = spec.validate_schema().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_validate_root_must_be_object() {
        let err = spec().validate(&json!(42)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Type);
        assert_eq!(err.path, "");
    }

    #[test]
    fn test_render_preserves_order_and_masks() {
        let spec = spec();
        let mut value = spec.default_value();
        value.insert("admin-password".into(), json!("supersecret"));

        let display = spec.render_with_values(&value);
        let keys: Vec<_> = display.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["ui-port", "admin-password", "log-level", "advanced"]);

        let password = display.find("admin-password").unwrap();
        assert_eq!(password.value, json!(MASKED_PLACEHOLDER));
        assert_eq!(password.default, json!(MASKED_PLACEHOLDER));
        assert!(password.masked);

        let token = display.find("advanced.token").unwrap();
        assert_eq!(token.value, json!(MASKED_PLACEHOLDER));

        let host = display.find("advanced.tor-proxy-host").unwrap();
        assert_eq!(host.value, json!("127.0.0.1"));

        let rendered = serde_json::to_string(&display).unwrap();
        assert!(!rendered.contains("supersecret"));
        assert!(!rendered.contains("abc"));
    }

    #[test]
    fn test_render_enum_choices() {
        let display = spec().render_with_values(&ConfigValue::new());
        let level = display.find("log-level").unwrap();
        assert_eq!(level.value, json!("info"));
        assert_eq!(level.choices[0].label, "Debug");
    }

    #[test]
    fn test_lookup_nested() {
        let spec = spec();
        assert!(spec.lookup("advanced.tor-proxy-host").is_some());
        assert!(spec.lookup("advanced.missing").is_none());
        assert!(spec.lookup("ui-port.nested").is_none());
    }

    #[test]
    fn test_serde_keeps_declaration_order() {
        let spec = spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: ConfigSpec = serde_json::from_str(&json).unwrap();

        let keys: Vec<_> = back.options().iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["ui-port", "admin-password", "log-level", "advanced"]);
        assert_eq!(back.get("ui-port"), spec.get("ui-port"));
        assert_eq!(back.get("log-level"), spec.get("log-level"));
    }

    #[test]
    fn test_serialized_spec_masks_secret_defaults() {
        let spec = spec();
        let generated = spec.default_value()["admin-password"].clone();
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["admin-password"]["default"], json!(MASKED_PLACEHOLDER));
        assert_eq!(json["advanced"]["spec"]["token"]["default"], json!(MASKED_PLACEHOLDER));
        assert_eq!(
            json["advanced"]["spec"]["tor-proxy-host"]["default"],
            json!("127.0.0.1")
        );
        assert!(!json.to_string().contains(generated.as_str().unwrap()));
    }
}
