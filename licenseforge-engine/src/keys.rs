//! Loading and holding the key material of a deployment.
//!
//! Key material is loaded once and never mutated. Rotating keys means
//! loading a new [`KeyMaterial`] and building a new engine around it.

use crate::config::KeyConfig;
use crate::error::{LicenseError, LicenseResult};
use licenseforge_crypto::{Algorithm, PrivateKey, PublicKey, SymmetricKey};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One asymmetric key pair and an optional symmetric key.
///
/// The private key is absent in verification-only deployments.
pub struct KeyMaterial {
    algorithm: Algorithm,
    private_key: Option<PrivateKey>,
    public_key: PublicKey,
    symmetric_key: Option<SymmetricKey>,
}

impl KeyMaterial {
    /// Builds key material from PEM text and raw symmetric key bytes.
    ///
    /// # Errors
    /// - [`LicenseError::Configuration`] wrapping `KeyFormat`, `KeyType` or
    ///   `KeyLength` from the crypto layer.
    /// - [`LicenseError::KeyPairMismatch`] if the public key does not belong
    ///   to the private key.
    pub fn load(
        algorithm: Algorithm,
        private_pem: &str,
        public_pem: &str,
        symmetric_key: Option<&[u8]>,
    ) -> LicenseResult<Self> {
        let private_key =
            PrivateKey::from_pem(algorithm, private_pem).map_err(LicenseError::Configuration)?;
        let public_key =
            PublicKey::from_pem(algorithm, public_pem).map_err(LicenseError::Configuration)?;

        if private_key.public_key() != public_key {
            return Err(LicenseError::KeyPairMismatch);
        }

        Ok(Self {
            algorithm,
            private_key: Some(private_key),
            public_key,
            symmetric_key: symmetric_from(symmetric_key)?,
        })
    }

    /// Builds verification-only key material. Such a set can validate but
    /// not issue.
    pub fn load_public(
        algorithm: Algorithm,
        public_pem: &str,
        symmetric_key: Option<&[u8]>,
    ) -> LicenseResult<Self> {
        let public_key =
            PublicKey::from_pem(algorithm, public_pem).map_err(LicenseError::Configuration)?;

        Ok(Self {
            algorithm,
            private_key: None,
            public_key,
            symmetric_key: symmetric_from(symmetric_key)?,
        })
    }

    /// Builds key material from a freshly generated private key.
    pub fn from_private_key(
        private_key: PrivateKey,
        symmetric_key: Option<SymmetricKey>,
    ) -> Self {
        Self {
            algorithm: private_key.algorithm(),
            public_key: private_key.public_key(),
            private_key: Some(private_key),
            symmetric_key,
        }
    }

    /// Reads the key files named by `config` and loads a full key set.
    pub fn load_from_config(config: &KeyConfig) -> LicenseResult<Self> {
        let private_pem = read_text(&config.private_key_path)?;
        let public_pem = read_text(&config.public_key_path)?;
        let symmetric = read_optional(config.symmetric_key_path.as_deref())?;

        let material = Self::load(config.algorithm, &private_pem, &public_pem, symmetric.as_deref())?;
        debug!(
            algorithm = %config.algorithm,
            encryption = material.symmetric_key.is_some(),
            "loaded key material"
        );
        Ok(material)
    }

    /// Reads only the public and symmetric key files named by `config`.
    pub fn load_public_from_config(config: &KeyConfig) -> LicenseResult<Self> {
        let public_pem = read_text(&config.public_key_path)?;
        let symmetric = read_optional(config.symmetric_key_path.as_deref())?;

        let material = Self::load_public(config.algorithm, &public_pem, symmetric.as_deref())?;
        debug!(algorithm = %config.algorithm, "loaded verification key material");
        Ok(material)
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the signing key, if this set can issue.
    #[must_use]
    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    #[must_use]
    pub fn symmetric_key(&self) -> Option<&SymmetricKey> {
        self.symmetric_key.as_ref()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("symmetric_key", &self.symmetric_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

fn symmetric_from(bytes: Option<&[u8]>) -> LicenseResult<Option<SymmetricKey>> {
    bytes
        .map(SymmetricKey::from_slice)
        .transpose()
        .map_err(LicenseError::Configuration)
}

fn read_text(path: &Path) -> LicenseResult<String> {
    std::fs::read_to_string(path).map_err(|source| LicenseError::KeyFile {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: Option<&Path>) -> LicenseResult<Option<Vec<u8>>> {
    path.map(|path| {
        std::fs::read(path).map_err(|source| LicenseError::KeyFile {
            path: path.to_path_buf(),
            source,
        })
    })
    .transpose()
}
