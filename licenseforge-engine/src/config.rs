//! Key file configuration.

use crate::error::{LicenseError, LicenseResult};
use licenseforge_crypto::Algorithm;
use std::path::PathBuf;

pub const ENV_ALGORITHM: &str = "LICENSEFORGE_ALGORITHM";
pub const ENV_PRIVATE_KEY: &str = "LICENSEFORGE_PRIVATE_KEY";
pub const ENV_PUBLIC_KEY: &str = "LICENSEFORGE_PUBLIC_KEY";
pub const ENV_SYMMETRIC_KEY: &str = "LICENSEFORGE_SYMMETRIC_KEY";

const DEFAULT_PRIVATE_KEY: &str = "./private_key.pem";
const DEFAULT_PUBLIC_KEY: &str = "./public_key.pem";

/// Where the key material lives and which signature algorithm it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub algorithm: Algorithm,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    /// Raw 32-byte key file. Encryption is unavailable without it.
    pub symmetric_key_path: Option<PathBuf>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Rsa,
            private_key_path: PathBuf::from(DEFAULT_PRIVATE_KEY),
            public_key_path: PathBuf::from(DEFAULT_PUBLIC_KEY),
            symmetric_key_path: None,
        }
    }
}

impl KeyConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> LicenseResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset or empty variables.
    pub fn from_lookup<F>(lookup: F) -> LicenseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let algorithm = match get(ENV_ALGORITHM) {
            Some(raw) => raw.parse::<Algorithm>().map_err(|e| {
                tracing::warn!("{ENV_ALGORITHM} holds an unsupported value");
                LicenseError::Configuration(e)
            })?,
            None => defaults.algorithm,
        };

        Ok(Self {
            algorithm,
            private_key_path: get(ENV_PRIVATE_KEY)
                .map(PathBuf::from)
                .unwrap_or(defaults.private_key_path),
            public_key_path: get(ENV_PUBLIC_KEY)
                .map(PathBuf::from)
                .unwrap_or(defaults.public_key_path),
            symmetric_key_path: get(ENV_SYMMETRIC_KEY).map(PathBuf::from),
        })
    }
}
