//! Property tests for validation and the get/set contract

mod common;

use common::{TestFixture, as_tree, config_with, valid_config};
use hostconf::{Error, Procedures, ValidationErrorKind, Version, package};
use proptest::prelude::*;
use serde_json::json;

fn port_kind(port: i64) -> Option<ValidationErrorKind> {
    let spec = package::config_spec();
    match spec.validate(&config_with("api-port", json!(port))) {
        Ok(_) => None,
        Err(e) => Some(e.kind),
    }
}

proptest! {
    #[test]
    fn ports_in_range_are_accepted(port in 1024i64..=65535) {
        prop_assert_eq!(port_kind(port), None);
    }

    #[test]
    fn ports_out_of_range_are_rejected(
        port in prop_oneof![i64::MIN / 2..1024i64, 65536i64..i64::MAX / 2]
    ) {
        prop_assert_eq!(port_kind(port), Some(ValidationErrorKind::Range));
    }

    #[test]
    fn passwords_from_the_allowed_alphabet_are_accepted(password in "[a-zA-Z0-9!@#$%^&*]{1,40}") {
        let spec = package::config_spec();
        prop_assert!(spec.validate(&config_with("admin-password", json!(password))).is_ok());
    }

    #[test]
    fn passwords_with_other_characters_are_rejected(
        prefix in "[a-z]{0,5}",
        bad in "[ <>?/\\\\|~`'\"]",
        suffix in "[a-z]{0,5}",
    ) {
        let spec = package::config_spec();
        let password = format!("{prefix}{bad}{suffix}");
        let err = spec
            .validate(&config_with("admin-password", json!(password)))
            .unwrap_err();
        prop_assert_eq!(err.kind, ValidationErrorKind::Pattern);
    }

    #[test]
    fn version_order_ignores_trailing_zeros(parts in prop::collection::vec(0u64..1000, 1..=3)) {
        let short = Version::new(&parts).unwrap();
        let mut padded = parts.clone();
        padded.push(0);
        let long = Version::new(&padded).unwrap();
        prop_assert_eq!(short, long);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn accepted_sets_round_trip(
        api in 1024u16..=65535,
        instances in 1u8..=50,
        interval in 5u16..=1440,
        level in prop::sample::select(vec!["debug", "info", "warn", "error"]),
        tor in any::<bool>(),
    ) {
        let fixture = TestFixture::new();
        let mut candidate = valid_config();
        candidate["api-port"] = json!(api);
        candidate["max-instances"] = json!(instances);
        candidate["log-level"] = json!(level);
        candidate["enable-tor-proxy"] = json!(tor);
        candidate["advanced"]["peer-discovery-interval"] = json!(interval);

        fixture.package.set_config(&candidate).unwrap();
        prop_assert_eq!(fixture.package.get_config().config, as_tree(&candidate));
    }

    #[test]
    fn rejected_sets_leave_state_alone(instances in 51u32..10_000) {
        let fixture = TestFixture::new();
        fixture.package.set_config(&valid_config()).unwrap();
        let before = fixture.package.get_config().config;

        let err = fixture
            .package
            .set_config(&config_with("max-instances", json!(instances)))
            .unwrap_err();
        prop_assert!(matches!(err, Error::Validation(_)));
        prop_assert_eq!(fixture.package.get_config().config, before);
    }
}
