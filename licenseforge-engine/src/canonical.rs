//! Canonical encoding of license claims.
//!
//! The encoding is compact JSON with a fixed field order, maps and sets in
//! sorted key order and timestamps in the single UTC seconds format. The
//! same logical claims always yield the same bytes, which is what the
//! signature covers.

use crate::claims::{LicenseClaims, timestamp};
use crate::error::{LicenseError, LicenseResult};
use licenseforge_crypto::{DIGEST_SIZE, sha256};
use serde::Serialize;
use std::collections::BTreeMap;

/// Borrowed view of the claims in signing order. Field order here is the
/// wire order of the encoding and must not change.
#[derive(Serialize)]
struct CanonicalClaims<'a> {
    customer_id: &'a str,
    modules: &'a BTreeMap<String, bool>,
    features: Vec<&'a str>,
    not_before: String,
    not_after: String,
    machine_id: &'a str,
    grace_period_days: u32,
    limits: &'a BTreeMap<String, u64>,
}

/// Encodes claims into their canonical byte form.
///
/// # Errors
/// [`LicenseError::Encoding`] if a module, feature or limit name is empty.
pub fn encode(claims: &LicenseClaims) -> LicenseResult<Vec<u8>> {
    check_names("module", claims.modules().keys())?;
    check_names("feature", claims.features().iter())?;
    check_names("limit", claims.limits().keys())?;

    let view = CanonicalClaims {
        customer_id: claims.customer_id(),
        modules: claims.modules(),
        features: claims.features().iter().map(String::as_str).collect(),
        not_before: timestamp::format(&claims.not_before()),
        not_after: timestamp::format(&claims.not_after()),
        machine_id: claims.machine_id(),
        grace_period_days: claims.grace_period_days(),
        limits: claims.limits(),
    };

    serde_json::to_vec(&view).map_err(|e| LicenseError::Encoding(e.to_string()))
}

/// SHA-256 of the canonical encoding.
pub fn digest(claims: &LicenseClaims) -> LicenseResult<[u8; DIGEST_SIZE]> {
    encode(claims).map(|bytes| sha256(&bytes))
}

fn check_names<'a>(kind: &str, mut names: impl Iterator<Item = &'a String>) -> LicenseResult<()> {
    if names.any(|name| name.is_empty()) {
        return Err(LicenseError::Encoding(format!("empty {kind} name")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn encoding_has_fixed_layout() {
        let claims = LicenseClaims::builder("C-1")
            .module("wifi", false)
            .module("log", true)
            .feature("b")
            .feature("a")
            .not_before(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .not_after(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
            .grace_period_days(30)
            .limit("max_users", 5)
            .build()
            .unwrap();

        let encoded = String::from_utf8(encode(&claims).unwrap()).unwrap();
        assert_eq!(
            encoded,
            r#"{"customer_id":"C-1","modules":{"log":true,"wifi":false},"features":["a","b"],"not_before":"2025-01-01T00:00:00Z","not_after":"2026-01-01T00:00:00Z","machine_id":"","grace_period_days":30,"limits":{"max_users":5}}"#
        );
    }

    #[test]
    fn empty_names_are_rejected() {
        let claims = LicenseClaims::builder("C-1").module("", true).build().unwrap();
        assert!(matches!(encode(&claims), Err(LicenseError::Encoding(_))));

        let claims = LicenseClaims::builder("C-1").limit("", 1).build().unwrap();
        assert!(matches!(encode(&claims), Err(LicenseError::Encoding(_))));
    }
}
