//! Error types for the licensing engine.
//!
//! Validation of an artifact never surfaces these to the caller: every
//! cryptographic or structural failure collapses into
//! [`LicenseVerdict::Invalid`](crate::LicenseVerdict::Invalid), and the
//! variant is only logged.

use licenseforge_crypto::CryptoError;
use std::path::PathBuf;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key material could not be decoded or has the wrong type/length.
    #[error("key configuration error: {0}")]
    Configuration(#[source] CryptoError),

    /// A key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured public key does not belong to the private key.
    #[error("public key does not match private key")]
    KeyPairMismatch,

    /// Claims hold a value the canonical encoding does not allow.
    #[error("claims cannot be encoded: {0}")]
    Encoding(String),

    /// Claims violate an invariant (empty customer, inverted window).
    #[error("invalid license claims: {0}")]
    InvalidClaims(String),

    /// Signing or encryption failed, or the needed key is not loaded.
    #[error("cryptographic operation failed: {0}")]
    CryptoOperation(String),

    /// Signature bytes are not a signature value at all.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Signature is well-formed but does not cover these claims.
    #[error("license signature does not match claims")]
    SignatureMismatch,

    /// Encrypted artifact could not be decrypted.
    #[error("license decryption failed: {0}")]
    Decryption(String),

    /// Artifact is neither a signed package nor a framed encrypted blob.
    #[error("malformed license artifact: {0}")]
    MalformedArtifact(String),

    /// License key string does not match the expected pattern.
    #[error("invalid license key string: {0}")]
    InvalidKeyString(String),

    /// Customer is unknown to the customer repository.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Repository failure.
    #[error("repository error: {0}")]
    Repository(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
