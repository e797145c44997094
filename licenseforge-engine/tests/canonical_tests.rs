mod common;

use common::utc;
use licenseforge_engine::{LicenseClaims, digest, encode};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn reverse_insertion_order_encodes_identically() {
    let forward = LicenseClaims::builder("C-1")
        .module("a", true)
        .module("b", false)
        .module("c", true)
        .feature("x")
        .feature("y")
        .limit("max_users", 5)
        .limit("max_devices", 2)
        .not_before(utc(2025, 1, 1))
        .not_after(utc(2026, 1, 1))
        .build()
        .unwrap();
    let reverse = LicenseClaims::builder("C-1")
        .limit("max_devices", 2)
        .limit("max_users", 5)
        .feature("y")
        .feature("x")
        .module("c", true)
        .module("b", false)
        .module("a", true)
        .not_after(utc(2026, 1, 1))
        .not_before(utc(2025, 1, 1))
        .build()
        .unwrap();

    assert_eq!(encode(&forward).unwrap(), encode(&reverse).unwrap());
    assert_eq!(digest(&forward).unwrap(), digest(&reverse).unwrap());
}

#[test]
fn timezone_does_not_change_encoding() {
    let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
    let utc_claims = LicenseClaims::builder("C-1")
        .not_before(utc(2025, 1, 1))
        .not_after(utc(2026, 1, 1))
        .build()
        .unwrap();
    let local_claims = LicenseClaims::builder("C-1")
        .not_before(utc(2025, 1, 1).with_timezone(&offset))
        .not_after(utc(2026, 1, 1).with_timezone(&offset))
        .build()
        .unwrap();
    assert_eq!(encode(&utc_claims).unwrap(), encode(&local_claims).unwrap());
}

#[test]
fn field_values_cannot_collide_through_escaping() {
    let a = LicenseClaims::builder("C-1\",\"x")
        .not_before(utc(2025, 1, 1))
        .not_after(utc(2026, 1, 1))
        .build()
        .unwrap();
    let b = LicenseClaims::builder("C-1")
        .feature("x")
        .not_before(utc(2025, 1, 1))
        .not_after(utc(2026, 1, 1))
        .build()
        .unwrap();
    assert_ne!(encode(&a).unwrap(), encode(&b).unwrap());
}

proptest! {
    #[test]
    fn insertion_order_never_matters(
        modules in prop::collection::vec(("[a-z]{1,6}", any::<bool>()), 0..8),
        features in prop::collection::vec("[a-z]{1,6}", 0..8),
    ) {
        // Later duplicates win in the builder, so dedupe on name first.
        let mut unique = std::collections::BTreeMap::new();
        for (name, enabled) in &modules {
            unique.insert(name.clone(), *enabled);
        }

        let build = |mods: Vec<(&String, &bool)>, feats: Vec<&String>| {
            let mut builder = LicenseClaims::builder("C-1")
                .not_before(utc(2025, 1, 1))
                .not_after(utc(2026, 1, 1));
            for (name, enabled) in mods {
                builder = builder.module(name.clone(), *enabled);
            }
            for feature in feats {
                builder = builder.feature(feature.clone());
            }
            builder.build().unwrap()
        };

        let forward = build(unique.iter().collect(), features.iter().collect());
        let reverse = build(unique.iter().rev().collect(), features.iter().rev().collect());
        prop_assert_eq!(encode(&forward).unwrap(), encode(&reverse).unwrap());
    }
}
