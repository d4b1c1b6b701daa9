//! Documentation generator for configuration schemas
//!
//! Generates markdown reference docs (for package instructions) from a
//! [`ConfigSpec`]. Sensitive defaults are never written out.

use crate::config::{ConfigSpec, OptionKind, OptionSpec};
use crate::secrets::MASKED_PLACEHOLDER;
use serde_json::Value;
use std::fmt::Write;

/// Configuration for docs generation
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    /// Title for the documentation
    pub title: Option<String>,
    /// Description/introduction text
    pub description: Option<String>,
    /// Whether to include operator warnings
    pub show_warnings: bool,
}

impl DocsConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            show_warnings: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    #[must_use]
    pub fn hide_warnings(mut self) -> Self {
        self.show_warnings = false;
        self
    }
}

/// Generate markdown documentation for a schema.
///
/// Options appear in declaration order. Object options become a section of
/// their own, with nested keys written as dotted paths.
#[must_use]
pub fn generate_docs(spec: &ConfigSpec, config: &DocsConfig) -> String {
    let mut output = String::new();

    let title = config.title.as_deref().unwrap_or("Configuration Reference");
    let _ = writeln!(output, "# {title}\n");

    if let Some(desc) = &config.description {
        let _ = writeln!(output, "{desc}\n");
    }

    output.push_str("## Options\n\n");
    write_level(&mut output, spec, "", config);
    output
}

fn write_level(out: &mut String, spec: &ConfigSpec, prefix: &str, config: &DocsConfig) {
    let mut objects = Vec::new();
    for option in spec.options() {
        let path = format!("{prefix}{}", option.key);
        match &option.kind {
            OptionKind::Object(object) => objects.push((path, option, &object.spec)),
            _ => format_option(out, &path, option, config),
        }
    }

    for (path, option, nested) in objects {
        let _ = writeln!(out, "## {}\n", option.name);
        if let Some(desc) = &option.description {
            let _ = writeln!(out, "{desc}\n");
        }
        write_level(out, nested, &format!("{path}."), config);
    }
}

fn format_option(out: &mut String, path: &str, option: &OptionSpec, config: &DocsConfig) {
    let _ = writeln!(out, "### {} (`{path}`)\n", option.name);

    let mut badges = Vec::new();
    if !option.is_required() {
        badges.push("Optional");
    }
    if option.is_sensitive() {
        badges.push("Secret");
    }
    if config.show_warnings && option.warning.is_some() {
        badges.push("Requires Care");
    }
    if !badges.is_empty() {
        let _ = writeln!(out, "{}\n", badges.join(" • "));
    }

    if let Some(desc) = &option.description {
        let _ = writeln!(out, "{desc}\n");
    }

    out.push_str("| Property | Value |\n");
    out.push_str("|----------|-------|\n");
    let _ = writeln!(out, "| **Type** | {} |", format_type(&option.kind));

    let default = if option.is_sensitive() {
        format!("`{MASKED_PLACEHOLDER}` (generated)")
    } else {
        format!("`{}`", format_value(&option.default_value()))
    };
    let _ = writeln!(out, "| **Default** | {default} |");

    match &option.kind {
        OptionKind::Number(n) => {
            if n.range.is_bounded() {
                let _ = writeln!(out, "| **Range** | `{}` |", n.range);
            }
            if let Some(units) = &n.units {
                let _ = writeln!(out, "| **Units** | {units} |");
            }
        }
        OptionKind::String(s) => {
            if let Some(pattern) = &s.pattern {
                let _ = writeln!(out, "| **Pattern** | `{pattern}` |");
            }
            if let Some(desc) = &s.pattern_description {
                let _ = writeln!(out, "| **Format** | {desc} |");
            }
        }
        _ => {}
    }
    out.push('\n');

    if let OptionKind::Enum(e) = &option.kind {
        out.push_str("**Options:**\n\n");
        for value in &e.values {
            let _ = writeln!(out, "- `{value}` - {}", e.label(value));
        }
        out.push('\n');
    }

    if config.show_warnings {
        if let Some(warning) = &option.warning {
            let _ = writeln!(out, "> **Warning:** {warning}\n");
        }
    }

    out.push_str("---\n\n");
}

fn format_type(kind: &OptionKind) -> &'static str {
    match kind {
        OptionKind::Number(n) if n.integral => "Integer",
        OptionKind::Number(_) => "Number",
        OptionKind::String(_) => "String",
        OptionKind::Boolean(_) => "Boolean",
        OptionKind::Enum(_) => "Enum",
        OptionKind::Object(_) => "Object",
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
