//! Read-only display projection of the applied configuration
//!
//! Renders to the host's versioned properties document:
//!
//! ```json
//! { "version": 2, "data": { "API Port": { "type": "string", "value": "8080", ... } } }
//! ```

use crate::config::{ConfigSpec, ConfigValue, OptionKind, OptionSpec};
use crate::secrets::MASKED_PLACEHOLDER;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Properties document format version understood by the host
pub const PROPERTIES_VERSION: u8 = 2;

/// Shown for options with no value
const NOT_SET: &str = "Not set";

/// One entry of the properties document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyEntry {
    String {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        copyable: bool,
        qr: bool,
        masked: bool,
    },
    Object {
        value: Properties,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl PropertyEntry {
    /// Displayed text for string entries
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::String { value, .. } => Some(value),
            Self::Object { .. } => None,
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, Self::String { masked: true, .. })
    }
}

/// Ordered display name to entry mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertyEntry)>);

impl Properties {
    pub fn get(&self, name: &str) -> Option<&PropertyEntry> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, entry) in &self.0 {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// The versioned document handed to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesDocument {
    pub version: u8,
    pub data: Properties,
}

/// Project `value` through `spec` for display.
///
/// Pure: the same inputs always render the same document. Sensitive options
/// render the mask placeholder and are never copyable.
pub fn render(spec: &ConfigSpec, value: &ConfigValue) -> PropertiesDocument {
    PropertiesDocument {
        version: PROPERTIES_VERSION,
        data: render_level(spec, value),
    }
}

fn render_level(spec: &ConfigSpec, value: &ConfigValue) -> Properties {
    Properties(
        spec.options()
            .iter()
            .map(|option| {
                let current = value.get(&option.key).unwrap_or(&Value::Null);
                (option.name.clone(), render_entry(option, current))
            })
            .collect(),
    )
}

fn render_entry(option: &OptionSpec, current: &Value) -> PropertyEntry {
    if let OptionKind::Object(object) = &option.kind {
        let nested = current.as_object().cloned().unwrap_or_default();
        return PropertyEntry::Object {
            value: render_level(&object.spec, &nested),
            description: option.description.clone(),
        };
    }

    let masked = option.is_sensitive();
    let value = if masked && !current.is_null() {
        MASKED_PLACEHOLDER.to_string()
    } else {
        display_text(&option.kind, current)
    };
    let copyable = !masked && matches!(&option.kind, OptionKind::String(s) if s.copyable);

    PropertyEntry::String {
        value,
        description: option.description.clone(),
        copyable,
        qr: false,
        masked,
    }
}

fn display_text(kind: &OptionKind, current: &Value) -> String {
    match (kind, current) {
        (_, Value::Null) => NOT_SET.to_string(),
        (OptionKind::Number(n), Value::Number(v)) => match &n.units {
            Some(units) => format!("{v} {units}"),
            None => v.to_string(),
        },
        (OptionKind::Enum(e), Value::String(v)) => e.label(v).to_string(),
        (OptionKind::Boolean(_), Value::Bool(b)) => {
            if *b { "Enabled" } else { "Disabled" }.to_string()
        }
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}
