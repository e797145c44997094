//! License issuance and validation for LicenseForge.
//!
//! This crate handles:
//! - Canonical encoding of license claims
//! - Signing and verifying claims with RSA or ECDSA P-256
//! - Optional AES-256-CBC encryption of the signed package
//! - Human-typable license key strings used as lookup handles
//! - Machine fingerprinting for license binding
//!
//! # Validation
//!
//! Validating an artifact yields a [`LicenseVerdict`], never an error.
//! Decryption, parsing and signature failures all become
//! [`LicenseVerdict::Invalid`]; the underlying reason is only logged.
//!
//! # Artifact Format
//!
//! Signed: `{"data": {<claims>}, "signature": "<base64>"}`.
//! Encrypted: `base64(iv || ciphertext)` of that JSON.

mod artifact;
mod canonical;
mod claims;
mod config;
mod engine;
mod error;
mod key_string;
mod keys;
mod machine;
mod repository;
mod service;
mod signer;

pub use artifact::{LicenseArtifact, SignedPackage};
pub use canonical::{digest, encode};
pub use claims::{DEFAULT_VALIDITY_MONTHS, LicenseClaims, LicenseClaimsBuilder, timestamp};
pub use config::{ENV_ALGORITHM, ENV_PRIVATE_KEY, ENV_PUBLIC_KEY, ENV_SYMMETRIC_KEY, KeyConfig};
pub use engine::{IssuedLicense, LicenseEngine, LicenseVerdict};
pub use error::{LicenseError, LicenseResult};
pub use key_string::{ALPHABET, GROUP_COUNT, GROUP_LEN, KEY_STRING_LEN, LicenseKeyString};
pub use keys::KeyMaterial;
pub use machine::{MachineFingerprint, MachineInfo};
pub use repository::{CustomerRepository, InMemoryCustomers, InMemoryLicenses, LicenseRepository};
pub use service::LicenseService;
pub use signer::{sign, verify};

pub use licenseforge_crypto::Algorithm;
