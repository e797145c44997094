//! Asymmetric signing and verification over SHA-256 digests.
//!
//! A deployment picks one [`Algorithm`] and uses it for both halves of the
//! key pair. Keys are decoded from PEM:
//!
//! - RSA: PKCS#8 `PRIVATE KEY` or PKCS#1 `RSA PRIVATE KEY`, SPKI
//!   `PUBLIC KEY` or PKCS#1 `RSA PUBLIC KEY`. Signatures are PKCS#1 v1.5.
//! - ECDSA (P-256): PKCS#8 `PRIVATE KEY` or SEC1 `EC PRIVATE KEY`, SPKI
//!   `PUBLIC KEY`. Signatures are RFC 6979 deterministic, ASN.1 DER encoded.

use crate::error::{CryptoError, CryptoResult};
use p256::ecdsa::{
    Signature as EcdsaSignature, SigningKey as EcdsaSigningKey,
    VerifyingKey as EcdsaVerifyingKey,
    signature::hazmat::{PrehashSigner, PrehashVerifier},
};
use pkcs8::spki::{DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoRef};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding, ObjectIdentifier, PrivateKeyInfo};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of the signed digest in bytes (SHA-256).
pub const DIGEST_SIZE: usize = 32;

/// Modulus size used when generating RSA keys.
pub const RSA_KEY_BITS: usize = 2048;

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Hashes `data` with SHA-256.
pub fn sha256(data: &[u8]) -> [u8; DIGEST_SIZE] {
    Sha256::digest(data).into()
}

/// The asymmetric algorithm family of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// RSA with PKCS#1 v1.5 signatures.
    Rsa,
    /// ECDSA on NIST P-256.
    Ecdsa,
}

impl Algorithm {
    /// Returns the lowercase name used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ecdsa => "ecdsa",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rsa" => Ok(Self::Rsa),
            "ecdsa" | "ec" | "p256" | "p-256" => Ok(Self::Ecdsa),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

fn decode_pem(input: &str) -> CryptoResult<pem::Pem> {
    pem::parse(input).map_err(|e| CryptoError::KeyFormat(e.to_string()))
}

/// Names the algorithm family an encoded key belongs to, or the raw OID
/// when it is neither RSA nor EC.
fn family_of(block: &pem::Pem) -> CryptoResult<String> {
    let oid = match block.tag() {
        "RSA PRIVATE KEY" | "RSA PUBLIC KEY" => return Ok(Algorithm::Rsa.to_string()),
        "EC PRIVATE KEY" => return Ok(Algorithm::Ecdsa.to_string()),
        "PRIVATE KEY" => {
            PrivateKeyInfo::try_from(block.contents())
                .map_err(|e| CryptoError::KeyFormat(e.to_string()))?
                .algorithm
                .oid
        }
        "PUBLIC KEY" => {
            SubjectPublicKeyInfoRef::try_from(block.contents())
                .map_err(|e| CryptoError::KeyFormat(e.to_string()))?
                .algorithm
                .oid
        }
        other => {
            return Err(CryptoError::KeyFormat(format!(
                "unexpected PEM label \"{other}\""
            )));
        }
    };

    Ok(if oid == RSA_ENCRYPTION_OID {
        Algorithm::Rsa.to_string()
    } else if oid == EC_PUBLIC_KEY_OID {
        Algorithm::Ecdsa.to_string()
    } else {
        oid.to_string()
    })
}

fn ensure_family(block: &pem::Pem, expected: Algorithm) -> CryptoResult<()> {
    let found = family_of(block)?;
    if found != expected.as_str() {
        return Err(CryptoError::KeyType { expected, found });
    }
    Ok(())
}

fn format_err(e: impl fmt::Display) -> CryptoError {
    CryptoError::KeyFormat(e.to_string())
}

/// A private signing key. Used only at issuance.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    Ecdsa(EcdsaSigningKey),
}

impl PrivateKey {
    /// Decodes a PEM private key, requiring it to belong to `algorithm`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KeyFormat`] if PEM/DER decoding fails,
    /// [`CryptoError::KeyType`] if the key is of another family.
    pub fn from_pem(algorithm: Algorithm, input: &str) -> CryptoResult<Self> {
        let block = decode_pem(input)?;
        ensure_family(&block, algorithm)?;

        match (algorithm, block.tag()) {
            (Algorithm::Rsa, "RSA PRIVATE KEY") => RsaPrivateKey::from_pkcs1_der(block.contents())
                .map(|k| Self::Rsa(Box::new(k)))
                .map_err(format_err),
            (Algorithm::Rsa, _) => RsaPrivateKey::from_pkcs8_der(block.contents())
                .map(|k| Self::Rsa(Box::new(k)))
                .map_err(format_err),
            (Algorithm::Ecdsa, "EC PRIVATE KEY") => p256::SecretKey::from_sec1_der(block.contents())
                .map(|k| Self::Ecdsa(EcdsaSigningKey::from(k)))
                .map_err(format_err),
            (Algorithm::Ecdsa, _) => EcdsaSigningKey::from_pkcs8_der(block.contents())
                .map(Self::Ecdsa)
                .map_err(format_err),
        }
    }

    /// Generates a fresh key pair for `algorithm` from the OS random source.
    pub fn generate(algorithm: Algorithm) -> CryptoResult<Self> {
        let mut rng = rand::rngs::OsRng;
        match algorithm {
            Algorithm::Rsa => RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
                .map(|k| Self::Rsa(Box::new(k)))
                .map_err(|e| CryptoError::KeyGeneration(e.to_string())),
            Algorithm::Ecdsa => Ok(Self::Ecdsa(EcdsaSigningKey::random(&mut rng))),
        }
    }

    /// Serializes the key as PKCS#8 PEM.
    pub fn to_pkcs8_pem(&self) -> CryptoResult<String> {
        let pem = match self {
            Self::Rsa(key) => key.to_pkcs8_pem(LineEnding::LF),
            Self::Ecdsa(key) => key.to_pkcs8_pem(LineEnding::LF),
        }
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok((*pem).clone())
    }

    /// Returns the algorithm family of this key.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Rsa(_) => Algorithm::Rsa,
            Self::Ecdsa(_) => Algorithm::Ecdsa,
        }
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            Self::Ecdsa(key) => PublicKey::Ecdsa(EcdsaVerifyingKey::from(key)),
        }
    }

    /// Signs a SHA-256 digest.
    pub fn sign_digest(&self, digest: &[u8; DIGEST_SIZE]) -> CryptoResult<Vec<u8>> {
        match self {
            Self::Rsa(key) => key
                .sign(Pkcs1v15Sign::new::<Sha256>(), digest)
                .map_err(|e| CryptoError::Signing(e.to_string())),
            Self::Ecdsa(key) => {
                let signature: EcdsaSignature = key
                    .sign_prehash(digest)
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A public verification key. Used only at validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ecdsa(EcdsaVerifyingKey),
}

impl PublicKey {
    /// Decodes a PEM public key, requiring it to belong to `algorithm`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::KeyFormat`] if PEM/DER decoding fails,
    /// [`CryptoError::KeyType`] if the key is of another family.
    pub fn from_pem(algorithm: Algorithm, input: &str) -> CryptoResult<Self> {
        let block = decode_pem(input)?;
        ensure_family(&block, algorithm)?;

        match (algorithm, block.tag()) {
            (Algorithm::Rsa, "RSA PUBLIC KEY") => RsaPublicKey::from_pkcs1_der(block.contents())
                .map(Self::Rsa)
                .map_err(format_err),
            (Algorithm::Rsa, _) => RsaPublicKey::from_public_key_der(block.contents())
                .map(Self::Rsa)
                .map_err(format_err),
            (Algorithm::Ecdsa, _) => EcdsaVerifyingKey::from_public_key_der(block.contents())
                .map(Self::Ecdsa)
                .map_err(format_err),
        }
    }

    /// Serializes the key as SubjectPublicKeyInfo PEM.
    pub fn to_public_key_pem(&self) -> CryptoResult<String> {
        match self {
            Self::Rsa(key) => key.to_public_key_pem(LineEnding::LF),
            Self::Ecdsa(key) => key.to_public_key_pem(LineEnding::LF),
        }
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))
    }

    /// Returns the algorithm family of this key.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Rsa(_) => Algorithm::Rsa,
            Self::Ecdsa(_) => Algorithm::Ecdsa,
        }
    }

    /// Checks `signature` against a SHA-256 digest.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match.
    ///
    /// # Errors
    ///
    /// [`CryptoError::MalformedSignature`] when the bytes cannot be a
    /// signature for this key at all (wrong RSA length, invalid DER).
    pub fn verify_digest(&self, digest: &[u8; DIGEST_SIZE], signature: &[u8]) -> CryptoResult<bool> {
        match self {
            Self::Rsa(key) => {
                if signature.len() != key.size() {
                    return Err(CryptoError::MalformedSignature(format!(
                        "expected {} bytes, got {}",
                        key.size(),
                        signature.len()
                    )));
                }
                Ok(key
                    .verify(Pkcs1v15Sign::new::<Sha256>(), digest, signature)
                    .is_ok())
            }
            Self::Ecdsa(key) => {
                let signature = EcdsaSignature::from_der(signature)
                    .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
                Ok(key.verify_prehash(digest, &signature).is_ok())
            }
        }
    }
}
