//! Option definitions and their validation rules
//!
//! # Overview
//!
//! An [`OptionSpec`] is one named, typed, constrained configuration field. Its
//! [`OptionKind`] carries the constraints that apply to that kind only:
//!
//! - **number**: range in interval notation, `integral` flag, optional units label
//! - **string**: regex pattern with a human-readable description, masking
//! - **boolean**: no constraints
//! - **enum**: closed set of values with display labels
//! - **object**: a nested [`ConfigSpec`]
//!
//! Validation is a single recursive dispatch on the kind, so the same rules
//! apply to top-level options, nested options, and the defaults themselves.
//!
//! ```rust
//! use hostconf::{NumberRange, OptionSpec, ValidationErrorKind};
//! use serde_json::json;
//!
//! let port = OptionSpec::number("port", "Port", 8080)
//!     .range(NumberRange::closed(1024.0, 65535.0))
//!     .integral();
//!
//! assert!(port.validate(Some(&json!(8080))).is_ok());
//! assert_eq!(
//!     port.validate(Some(&json!(70000))).unwrap_err().kind,
//!     ValidationErrorKind::Range
//! );
//! assert_eq!(
//!     port.validate(Some(&json!(8080.5))).unwrap_err().kind,
//!     ValidationErrorKind::Type
//! );
//! ```
//!
//! # Serialized form
//!
//! Options serialize the way the host reads them: the kind is the `type` tag,
//! `required` is written as its inverse `nullable`, sensitivity as `masked`, and
//! the operator advisory as `warning`. The key is not part of the option body;
//! it is the map key in the enclosing [`ConfigSpec`].

use crate::config::range::NumberRange;
use crate::config::spec::ConfigSpec;
use crate::error::{ValidationError, ValidationErrorKind};
use crate::secrets::{DEFAULT_PASSWORD_LENGTH, MASKED_PLACEHOLDER, generate_password};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

// =============================================================================
// Kind-specific constraints
// =============================================================================

/// Constraints for number options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberSpec {
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub range: NumberRange,
    #[serde(default)]
    pub integral: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default)]
    pub default: Option<Number>,
}

/// Constraints for string options
///
/// When `masked` is set the default serializes as the mask placeholder, since
/// a generated default is the live secret until the operator replaces it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StringSpec {
    #[serde(default)]
    pub nullable: bool,
    /// Sensitive: never shown or logged in clear
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub copyable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct StringSpecRepr<'a> {
    nullable: bool,
    masked: bool,
    copyable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<&'a str>,
    default: Option<&'a str>,
}

impl Serialize for StringSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default = match self.default.as_deref() {
            Some(_) if self.masked => Some(MASKED_PLACEHOLDER),
            other => other,
        };
        StringSpecRepr {
            nullable: self.nullable,
            masked: self.masked,
            copyable: self.copyable,
            pattern: self.pattern.as_deref(),
            pattern_description: self.pattern_description.as_deref(),
            placeholder: self.placeholder.as_deref(),
            default,
        }
        .serialize(serializer)
    }
}

/// Constraints for boolean options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanSpec {
    pub default: bool,
}

/// Constraints for enum options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnumSpec {
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_names: BTreeMap<String, String>,
    pub default: String,
}

impl EnumSpec {
    /// Display label for a value, falling back to the value itself
    pub fn label<'a>(&'a self, value: &'a str) -> &'a str {
        self.value_names.get(value).map_or(value, String::as_str)
    }
}

/// Nested option set for object options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub spec: ConfigSpec,
}

/// Kind of an option together with its constraint payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    Number(NumberSpec),
    String(StringSpec),
    Boolean(BooleanSpec),
    Enum(EnumSpec),
    Object(ObjectSpec),
}

impl OptionKind {
    /// Name of the kind as it appears in the `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Enum(_) => "enum",
            Self::Object(_) => "object",
        }
    }
}

// =============================================================================
// Option definition
// =============================================================================

/// A single named configuration field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Stable identifier, unique within its nesting level
    #[serde(skip)]
    pub key: String,

    /// Display name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Advisory text shown to the operator before changing the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    #[serde(flatten)]
    pub kind: OptionKind,
}

impl OptionSpec {
    fn with_kind(key: impl Into<String>, name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
            warning: None,
            kind,
        }
    }

    // =========================================================================
    // Kind constructors
    // =========================================================================

    /// Create a required number option
    pub fn number(key: impl Into<String>, name: impl Into<String>, default: impl Into<Number>) -> Self {
        Self::with_kind(
            key,
            name,
            OptionKind::Number(NumberSpec {
                nullable: false,
                range: NumberRange::unbounded(),
                integral: false,
                units: None,
                default: Some(default.into()),
            }),
        )
    }

    /// Create a required string option
    pub fn string(key: impl Into<String>, name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::with_kind(
            key,
            name,
            OptionKind::String(StringSpec {
                nullable: false,
                masked: false,
                copyable: false,
                pattern: None,
                pattern_description: None,
                placeholder: None,
                default: Some(default.into()),
            }),
        )
    }

    /// Create a masked, copyable string option whose default is a freshly
    /// generated alphanumeric password.
    ///
    /// The default is drawn once, when the option is constructed.
    pub fn password(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::string(key, name, generate_password(DEFAULT_PASSWORD_LENGTH))
            .masked()
            .copyable()
    }

    /// Create a boolean option
    pub fn boolean(key: impl Into<String>, name: impl Into<String>, default: bool) -> Self {
        Self::with_kind(key, name, OptionKind::Boolean(BooleanSpec { default }))
    }

    /// Create an enum option from `(value, label)` pairs
    ///
    /// Declaration order of the pairs is the display order of the values.
    pub fn enumeration<V, L>(
        key: impl Into<String>,
        name: impl Into<String>,
        default: impl Into<String>,
        values: impl IntoIterator<Item = (V, L)>,
    ) -> Self
    where
        V: Into<String>,
        L: Into<String>,
    {
        let mut spec = EnumSpec {
            values: Vec::new(),
            value_names: BTreeMap::new(),
            default: default.into(),
        };
        for (value, label) in values {
            let value = value.into();
            spec.value_names.insert(value.clone(), label.into());
            spec.values.push(value);
        }
        Self::with_kind(key, name, OptionKind::Enum(spec))
    }

    /// Create an object option grouping nested options
    pub fn object(key: impl Into<String>, name: impl Into<String>, spec: ConfigSpec) -> Self {
        Self::with_kind(key, name, OptionKind::Object(ObjectSpec { spec }))
    }

    // =========================================================================
    // Common modifiers
    // =========================================================================

    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    #[must_use]
    pub fn warning(mut self, text: impl Into<String>) -> Self {
        self.warning = Some(text.into());
        self
    }

    /// Allow `null` for number and string options. Other kinds are always required.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        match &mut self.kind {
            OptionKind::Number(n) => n.nullable = true,
            OptionKind::String(s) => s.nullable = true,
            _ => {}
        }
        self
    }

    // =========================================================================
    // Number modifiers
    // =========================================================================

    #[must_use]
    pub fn range(mut self, range: NumberRange) -> Self {
        if let OptionKind::Number(n) = &mut self.kind {
            n.range = range;
        }
        self
    }

    #[must_use]
    pub fn integral(mut self) -> Self {
        if let OptionKind::Number(n) = &mut self.kind {
            n.integral = true;
        }
        self
    }

    #[must_use]
    pub fn units(mut self, units: impl Into<String>) -> Self {
        if let OptionKind::Number(n) = &mut self.kind {
            n.units = Some(units.into());
        }
        self
    }

    // =========================================================================
    // String modifiers
    // =========================================================================

    /// Require the whole value to match `pattern`
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        if let OptionKind::String(s) = &mut self.kind {
            s.pattern = Some(pattern.into());
            s.pattern_description = Some(description.into());
        }
        self
    }

    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        if let OptionKind::String(s) = &mut self.kind {
            s.placeholder = Some(text.into());
        }
        self
    }

    /// Mark the option sensitive
    #[must_use]
    pub fn masked(mut self) -> Self {
        if let OptionKind::String(s) = &mut self.kind {
            s.masked = true;
        }
        self
    }

    #[must_use]
    pub fn copyable(mut self) -> Self {
        if let OptionKind::String(s) = &mut self.kind {
            s.copyable = true;
        }
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_required(&self) -> bool {
        match &self.kind {
            OptionKind::Number(n) => !n.nullable,
            OptionKind::String(s) => !s.nullable,
            _ => true,
        }
    }

    /// Whether the value must be masked in every display path
    pub fn is_sensitive(&self) -> bool {
        matches!(&self.kind, OptionKind::String(s) if s.masked)
    }

    /// Default value, assembled recursively for objects
    pub fn default_value(&self) -> Value {
        match &self.kind {
            OptionKind::Number(n) => n.default.clone().map_or(Value::Null, Value::Number),
            OptionKind::String(s) => s.default.clone().map_or(Value::Null, Value::String),
            OptionKind::Boolean(b) => Value::Bool(b.default),
            OptionKind::Enum(e) => Value::String(e.default.clone()),
            OptionKind::Object(o) => Value::Object(o.spec.default_value()),
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate a candidate value for this option.
    ///
    /// `None` means the key was absent from the enclosing object. On success the
    /// normalized value is returned (absent optional values become `null`,
    /// integral numbers written as `8080.0` become `8080`). Error paths are
    /// rooted at this option's key.
    pub fn validate(&self, value: Option<&Value>) -> Result<Value, ValidationError> {
        self.validate_kind(value)
            .map_err(|e| e.nested_under(&self.key))
    }

    fn validate_kind(&self, value: Option<&Value>) -> Result<Value, ValidationError> {
        let value = match value {
            None | Some(Value::Null) => {
                return if self.is_required() {
                    Err(missing(format!("{} is required", self.name)))
                } else {
                    Ok(Value::Null)
                };
            }
            Some(v) => v,
        };

        match &self.kind {
            OptionKind::Number(spec) => validate_number(spec, value),
            OptionKind::String(spec) => validate_string(spec, value),
            OptionKind::Boolean(_) => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(type_error("boolean", other)),
            },
            OptionKind::Enum(spec) => {
                let text = value.as_str().ok_or_else(|| type_error("string", value))?;
                if spec.values.iter().any(|v| v == text) {
                    Ok(value.clone())
                } else {
                    Err(ValidationError::new(
                        "",
                        ValidationErrorKind::Enum,
                        format!("must be one of: {}", spec.values.join(", ")),
                    ))
                }
            }
            OptionKind::Object(spec) => spec.spec.validate(value).map(Value::Object),
        }
    }
}

fn missing(reason: String) -> ValidationError {
    ValidationError::new("", ValidationErrorKind::MissingRequired, reason)
}

fn type_error(expected: &str, actual: &Value) -> ValidationError {
    let actual = match actual {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    ValidationError::new(
        "",
        ValidationErrorKind::Type,
        format!("expected {expected}, got {actual}"),
    )
}

fn validate_number(spec: &NumberSpec, value: &Value) -> Result<Value, ValidationError> {
    let Value::Number(number) = value else {
        return Err(type_error("number", value));
    };
    let n = number.as_f64().ok_or_else(|| type_error("number", value))?;

    let normalized = if spec.integral {
        if number.is_i64() || number.is_u64() {
            value.clone()
        } else if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Value::from(n as i64)
        } else {
            return Err(ValidationError::new(
                "",
                ValidationErrorKind::Type,
                format!("expected an integer, got {n}"),
            ));
        }
    } else {
        value.clone()
    };

    if !spec.range.contains(n) {
        return Err(ValidationError::new(
            "",
            ValidationErrorKind::Range,
            format!("{n} is outside {}", spec.range),
        ));
    }

    Ok(normalized)
}

fn validate_string(spec: &StringSpec, value: &Value) -> Result<Value, ValidationError> {
    let text = value.as_str().ok_or_else(|| type_error("string", value))?;

    if text.is_empty() {
        return if spec.nullable {
            Ok(value.clone())
        } else {
            Err(missing("must not be empty".to_string()))
        };
    }

    if let Some(ref pattern) = spec.pattern {
        let re = regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            ValidationError::new(
                "",
                ValidationErrorKind::Pattern,
                format!("invalid pattern: {e}"),
            )
        })?;
        if !re.is_match(text) {
            let reason = spec
                .pattern_description
                .clone()
                .unwrap_or_else(|| format!("must match {pattern}"));
            return Err(ValidationError::new("", ValidationErrorKind::Pattern, reason));
        }
    }

    Ok(value.clone())
}

// =============================================================================
// Definition checks
// =============================================================================

impl OptionSpec {
    /// Validate the option definition itself.
    ///
    /// Checks:
    /// - Range is satisfiable, and has an integer in it when `integral` is set
    /// - Pattern compiles
    /// - Enum has values and labels only for declared values
    /// - Nested object definitions, recursively
    /// - Default value satisfies the option's own constraints
    pub fn validate_schema(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("option key cannot be empty".to_string());
        }

        match &self.kind {
            OptionKind::Number(n) => {
                if !n.range.is_satisfiable() {
                    return Err(format!("range {} is empty", n.range));
                }
                if n.integral && !n.range.contains_integer() {
                    return Err(format!("range {} holds no integer", n.range));
                }
            }
            OptionKind::String(s) => {
                if let Some(ref pattern) = s.pattern {
                    if pattern.is_empty() {
                        return Err("pattern cannot be empty string".to_string());
                    }
                    regex::Regex::new(pattern).map_err(|e| format!("invalid regex pattern: {e}"))?;
                }
            }
            OptionKind::Enum(e) => {
                if e.values.is_empty() {
                    return Err("enum must declare at least one value".to_string());
                }
                if let Some(stray) = e.value_names.keys().find(|k| !e.values.contains(*k)) {
                    return Err(format!("label given for undeclared value '{stray}'"));
                }
            }
            OptionKind::Object(o) => {
                o.spec
                    .validate_schema()
                    .map_err(|e| format!("nested option invalid: {e}"))?;
            }
            OptionKind::Boolean(_) => {}
        }

        let default = self.default_value();
        self.validate(Some(&default))
            .map_err(|e| format!("default value is invalid: {e}"))?;

        Ok(())
    }
}

/// Validate an object-shaped value against a nested option list
pub(crate) fn validate_object(
    options: &[OptionSpec],
    value: &Value,
) -> Result<Map<String, Value>, ValidationError> {
    let Value::Object(candidate) = value else {
        return Err(type_error("object", value));
    };

    let mut validated = Map::with_capacity(options.len());
    for option in options {
        let v = option.validate(candidate.get(&option.key))?;
        validated.insert(option.key.clone(), v);
    }

    if let Some(unknown) = candidate
        .keys()
        .find(|k| !options.iter().any(|o| &o.key == *k))
    {
        return Err(ValidationError::new(
            unknown.clone(),
            ValidationErrorKind::UnknownKey,
            "not declared in the schema",
        ));
    }

    Ok(validated)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn port() -> OptionSpec {
        OptionSpec::number("port", "Port", 8080)
            .range(NumberRange::closed(1024.0, 65535.0))
            .integral()
    }

    #[test]
    fn test_number_validation() {
        let option = port();

        assert_eq!(option.validate(Some(&json!(8080))).unwrap(), json!(8080));
        assert_eq!(option.validate(Some(&json!(1024))).unwrap(), json!(1024));
        assert_eq!(option.validate(Some(&json!(65535))).unwrap(), json!(65535));

        let err = option.validate(Some(&json!(70000))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Range);
        assert_eq!(err.path, "port");

        let err = option.validate(Some(&json!(8080.5))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Type);

        let err = option.validate(Some(&json!("8080"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Type);
    }

    #[test]
    fn test_integral_float_is_normalized() {
        assert_eq!(port().validate(Some(&json!(8080.0))).unwrap(), json!(8080));
    }

    #[test]
    fn test_non_integral_number() {
        let option = OptionSpec::number("ratio", "Ratio", 1).range(NumberRange::closed(0.0, 2.0));
        assert_eq!(option.validate(Some(&json!(1.5))).unwrap(), json!(1.5));
    }

    #[test]
    fn test_required_and_nullable() {
        let err = port().validate(None).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingRequired);

        let err = port().validate(Some(&Value::Null)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingRequired);

        let optional = port().nullable();
        assert_eq!(optional.validate(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_string_pattern_validation() {
        let option = OptionSpec::string("host", "Host", "127.0.0.1")
            .pattern(r"[0-9.]+", "Digits and dots only");

        assert!(option.validate(Some(&json!("10.0.0.1"))).is_ok());

        let err = option.validate(Some(&json!("localhost"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Pattern);
        assert_eq!(err.reason, "Digits and dots only");

        // Pattern must cover the whole value
        let err = option.validate(Some(&json!("10.0.0.1x"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Pattern);
    }

    #[test]
    fn test_empty_string() {
        let required = OptionSpec::string("host", "Host", "a");
        let err = required.validate(Some(&json!(""))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingRequired);

        let optional = OptionSpec::string("host", "Host", "a")
            .pattern("[a-z]+", "letters")
            .nullable();
        assert_eq!(optional.validate(Some(&json!(""))).unwrap(), json!(""));
    }

    #[test]
    fn test_boolean_validation() {
        let option = OptionSpec::boolean("tor", "Tor", true);
        assert!(option.validate(Some(&json!(false))).is_ok());
        let err = option.validate(Some(&json!("true"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Type);
    }

    #[test]
    fn test_enum_validation() {
        let option = OptionSpec::enumeration(
            "level",
            "Level",
            "info",
            [("debug", "Debug"), ("info", "Info")],
        );
        assert!(option.validate(Some(&json!("debug"))).is_ok());

        let err = option.validate(Some(&json!("trace"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Enum);

        let err = option.validate(Some(&json!(1))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Type);
    }

    #[test]
    fn test_object_validation_paths() {
        let option = OptionSpec::object(
            "advanced",
            "Advanced",
            ConfigSpec::new()
                .option(port())
                .option(OptionSpec::boolean("detect", "Detect", true)),
        );

        let ok = option
            .validate(Some(&json!({"port": 9050, "detect": false})))
            .unwrap();
        assert_eq!(ok, json!({"port": 9050, "detect": false}));

        let err = option
            .validate(Some(&json!({"port": 1, "detect": false})))
            .unwrap_err();
        assert_eq!(err.path, "advanced.port");
        assert_eq!(err.kind, ValidationErrorKind::Range);

        let err = option
            .validate(Some(&json!({"port": 9050, "detect": false, "extra": 1})))
            .unwrap_err();
        assert_eq!(err.path, "advanced.extra");
        assert_eq!(err.kind, ValidationErrorKind::UnknownKey);

        let err = option.validate(Some(&json!({"port": 9050}))).unwrap_err();
        assert_eq!(err.path, "advanced.detect");
        assert_eq!(err.kind, ValidationErrorKind::MissingRequired);

        let err = option.validate(Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err.path, "advanced");
        assert_eq!(err.kind, ValidationErrorKind::Type);
    }

    #[test]
    fn test_integral_range_needs_an_integer() {
        let option = OptionSpec::number("ratio", "Ratio", 1)
            .range(NumberRange::closed(1.2, 1.8))
            .integral();
        let err = option.validate_schema().unwrap_err();
        assert!(err.contains("holds no integer"), "{err}");

        let fractional = OptionSpec::number("ratio", "Ratio", 1)
            .range(NumberRange::closed(0.5, 1.8));
        assert!(fractional.validate_schema().is_ok());
    }

    #[test]
    fn test_password_default() {
        let option = OptionSpec::password("admin-password", "Admin Password")
            .pattern("[a-zA-Z0-9!@#$%^&*]+", "Letters, numbers and symbols");

        assert!(option.is_sensitive());
        let default = option.default_value();
        assert_eq!(default.as_str().unwrap().len(), 16);
        assert!(option.validate_schema().is_ok());
    }

    #[test]
    fn test_schema_validation() {
        assert!(port().validate_schema().is_ok());

        // Default outside range
        let bad_default = OptionSpec::number("port", "Port", 80).range(NumberRange::closed(1024.0, 65535.0));
        assert!(bad_default.validate_schema().is_err());

        // Empty range
        let empty = OptionSpec::number("n", "N", 1).range(NumberRange::closed(5.0, 1.0));
        assert!(empty.validate_schema().is_err());

        // Enum default not a member
        let bad_enum = OptionSpec::enumeration("e", "E", "x", [("a", "A")]);
        assert!(bad_enum.validate_schema().is_err());

        // Broken regex
        let bad_regex = OptionSpec::string("s", "S", "a").pattern("[a-", "broken");
        assert!(bad_regex.validate_schema().is_err());
    }

    #[test]
    fn test_serialization_shape() {
        let option = port()
            .units("ports")
            .description("Listening port")
            .warning("Requires restart");
        let json = serde_json::to_value(&option).unwrap();

        assert_eq!(json["type"], "number");
        assert_eq!(json["name"], "Port");
        assert_eq!(json["range"], "[1024,65535]");
        assert_eq!(json["integral"], true);
        assert_eq!(json["nullable"], false);
        assert_eq!(json["default"], 8080);
        assert_eq!(json["warning"], "Requires restart");
        assert!(json.get("key").is_none());

        let back: OptionSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, option.kind);
    }

    #[test]
    fn test_enum_serialization_shape() {
        let option = OptionSpec::enumeration("level", "Level", "info", [("info", "Info (Recommended)")]);
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["values"], json!(["info"]));
        assert_eq!(json["value-names"]["info"], "Info (Recommended)");
    }
}
