//! Shared test helpers for engine tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use licenseforge_engine::{Algorithm, KeyMaterial, LicenseClaims, LicenseEngine};

pub const RSA_PRIVATE: &str = include_str!("../fixtures/rsa.pem");
pub const RSA_PUBLIC: &str = include_str!("../fixtures/rsa_pub.pem");
pub const EC_PRIVATE: &str = include_str!("../fixtures/ec.pem");
pub const EC_PUBLIC: &str = include_str!("../fixtures/ec_pub.pem");
pub const EC_OTHER_PRIVATE: &str = include_str!("../fixtures/ec2.pem");
pub const EC_OTHER_PUBLIC: &str = include_str!("../fixtures/ec2_pub.pem");

/// A fixed 32-byte symmetric key.
pub const SYMMETRIC_KEY: [u8; 32] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26,
    27, 28, 29, 30, 31, 32,
];

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn rsa_keys() -> KeyMaterial {
    KeyMaterial::load(Algorithm::Rsa, RSA_PRIVATE, RSA_PUBLIC, Some(&SYMMETRIC_KEY)).unwrap()
}

pub fn ec_keys() -> KeyMaterial {
    KeyMaterial::load(Algorithm::Ecdsa, EC_PRIVATE, EC_PUBLIC, Some(&SYMMETRIC_KEY)).unwrap()
}

pub fn rsa_engine() -> LicenseEngine {
    LicenseEngine::new(rsa_keys())
}

pub fn ec_engine() -> LicenseEngine {
    LicenseEngine::new(ec_keys())
}

/// Customer "C-1", modules `{log: true, wifi: false}`, valid for 2025 with
/// a 30-day grace period.
pub fn sample_claims() -> LicenseClaims {
    LicenseClaims::builder("C-1")
        .module("log", true)
        .module("wifi", false)
        .not_before(utc(2025, 1, 1))
        .not_after(utc(2026, 1, 1))
        .grace_period_days(30)
        .build()
        .unwrap()
}

/// Flips one bit of the byte at `index`.
pub fn flip(bytes: &mut [u8], index: usize) {
    bytes[index] ^= 0x01;
}
