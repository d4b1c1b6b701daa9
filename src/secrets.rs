//! Sensitive value helpers: convenience password defaults and display masking
//!
//! Generated passwords come from a general-purpose RNG and exist only to give a
//! fresh install a usable default. They are not a security guarantee.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::Value;

/// Placeholder shown wherever a sensitive value would otherwise be displayed
pub const MASKED_PLACEHOLDER: &str = "********";

/// Length of generated default passwords
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Generate an alphanumeric password of the given length
#[must_use]
pub fn generate_password(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Replace a sensitive value for display.
///
/// `null` stays `null` so an unset secret is distinguishable from a set one.
#[must_use]
pub fn mask(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        _ => Value::String(MASKED_PLACEHOLDER.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password() {
        let password = generate_password(DEFAULT_PASSWORD_LENGTH);
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        // Two draws of 62^16 colliding would mean the RNG is broken
        assert_ne!(password, generate_password(DEFAULT_PASSWORD_LENGTH));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(&Value::from("hunter2")), Value::from(MASKED_PLACEHOLDER));
        assert_eq!(mask(&Value::Null), Value::Null);
    }
}
