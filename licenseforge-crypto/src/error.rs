//! Error types for the crypto layer.

use crate::signing::Algorithm;
use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// PEM or DER decoding failed.
    #[error("invalid key format: {0}")]
    KeyFormat(String),

    /// The decoded key belongs to a different algorithm family.
    #[error("key type mismatch: expected {expected}, found {found}")]
    KeyType { expected: Algorithm, found: String },

    /// Invalid symmetric key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    /// Algorithm name not recognised.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Ciphertext is not a whole number of cipher blocks.
    #[error("ciphertext length {len} is not a multiple of the block size")]
    CiphertextLength { len: usize },

    /// Padding bytes are inconsistent (wrong key or tampered data).
    #[error("invalid padding")]
    Padding,

    /// Signature bytes cannot be parsed as a signature value.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// The signing primitive itself failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Key generation or serialization failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Blob framing or base64 decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}
