//! Distributable license artifacts.
//!
//! A signed package travels as JSON:
//!
//! ```text
//! { "data": { <claims> }, "signature": "<base64>" }
//! ```
//!
//! An encrypted artifact is the base64 of `iv || ciphertext`, where the
//! ciphertext decrypts to that JSON.

use crate::claims::LicenseClaims;
use crate::error::{LicenseError, LicenseResult};
use licenseforge_crypto::EncryptedBlob;
use serde::{Deserialize, Serialize};

/// Claims together with the signature over their canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignedPackage {
    #[serde(rename = "data")]
    claims: LicenseClaims,
    #[serde(with = "base64_bytes")]
    signature: Vec<u8>,
}

impl SignedPackage {
    /// Pairs claims with a signature. Nothing is verified here.
    pub fn new(claims: LicenseClaims, signature: Vec<u8>) -> Self {
        Self { claims, signature }
    }

    #[must_use]
    pub fn claims(&self) -> &LicenseClaims {
        &self.claims
    }

    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn into_claims(self) -> LicenseClaims {
        self.claims
    }

    pub fn to_json(&self) -> LicenseResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_bytes(&self) -> LicenseResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(input: &str) -> LicenseResult<Self> {
        Self::from_slice(input.as_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> LicenseResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| LicenseError::MalformedArtifact(e.to_string()))
    }
}

/// The externally distributed form of a license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseArtifact {
    /// Plaintext signed package.
    Signed(SignedPackage),
    /// Encrypted signed package.
    Encrypted(EncryptedBlob),
}

impl LicenseArtifact {
    /// Encodes the artifact as text: JSON when signed, base64 when encrypted.
    pub fn to_wire(&self) -> LicenseResult<String> {
        match self {
            Self::Signed(package) => package.to_json(),
            Self::Encrypted(blob) => Ok(blob.to_base64()),
        }
    }

    /// Decodes an artifact from text. Input whose first non-blank character
    /// is `{` is read as a signed package, anything else as base64.
    pub fn from_wire(input: &str) -> LicenseResult<Self> {
        let trimmed = input.trim();
        if trimmed.starts_with('{') {
            return SignedPackage::from_json(trimmed).map(Self::Signed);
        }

        EncryptedBlob::from_base64(trimmed)
            .map(Self::Encrypted)
            .map_err(|e| LicenseError::MalformedArtifact(e.to_string()))
    }

    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
