//! Signing and verifying claims.
//!
//! The signature covers the SHA-256 digest of the canonical encoding, so any
//! change to any claim changes what is verified.

use crate::canonical;
use crate::claims::LicenseClaims;
use crate::error::{LicenseError, LicenseResult};
use licenseforge_crypto::{CryptoError, PrivateKey, PublicKey};

/// Signs the canonical digest of `claims`.
pub fn sign(claims: &LicenseClaims, private_key: &PrivateKey) -> LicenseResult<Vec<u8>> {
    let digest = canonical::digest(claims)?;
    private_key
        .sign_digest(&digest)
        .map_err(|e| LicenseError::CryptoOperation(e.to_string()))
}

/// Checks `signature` against the canonical digest of `claims`.
///
/// Returns `Ok(false)` for a well-formed signature that does not match.
///
/// # Errors
/// [`LicenseError::MalformedSignature`] when the bytes are not a signature
/// value for this key at all.
pub fn verify(claims: &LicenseClaims, signature: &[u8], public_key: &PublicKey) -> LicenseResult<bool> {
    let digest = canonical::digest(claims)?;
    public_key
        .verify_digest(&digest, signature)
        .map_err(|e| match e {
            CryptoError::MalformedSignature(reason) => LicenseError::MalformedSignature(reason),
            other => LicenseError::CryptoOperation(other.to_string()),
        })
}
