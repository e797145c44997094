//! Argument parsing and file helpers for the `licenseforge` binary.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use licenseforge_crypto::{Algorithm, PrivateKey, generate_random_key};
use licenseforge_engine::{KeyConfig, LicenseClaims, LicenseVerdict};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PRIVATE_KEY_FILE: &str = "private_key.pem";
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";
pub const SYMMETRIC_KEY_FILE: &str = "symmetric.key";

/// Parses `name=true|false` for `--module`.
pub fn parse_module(input: &str) -> Result<(String, bool), String> {
    let (name, value) = split_pair(input)?;
    let enabled = match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        other => return Err(format!("module value must be true or false, got \"{other}\"")),
    };
    Ok((name, enabled))
}

/// Parses `name=value` for `--limit`.
pub fn parse_limit(input: &str) -> Result<(String, u64), String> {
    let (name, value) = split_pair(input)?;
    let value = value
        .parse::<u64>()
        .map_err(|e| format!("limit value \"{value}\" is not a non-negative integer: {e}"))?;
    Ok((name, value))
}

fn split_pair(input: &str) -> Result<(String, &str), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got \"{input}\""))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    Ok((name.to_string(), value.trim()))
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("\"{input}\" is neither RFC 3339 nor YYYY-MM-DD"))
}

/// Overrides environment configuration with whatever flags were given.
pub fn resolve_key_config(
    base: KeyConfig,
    algorithm: Option<Algorithm>,
    private_key: Option<PathBuf>,
    public_key: Option<PathBuf>,
    symmetric_key: Option<PathBuf>,
) -> KeyConfig {
    KeyConfig {
        algorithm: algorithm.unwrap_or(base.algorithm),
        private_key_path: private_key.unwrap_or(base.private_key_path),
        public_key_path: public_key.unwrap_or(base.public_key_path),
        symmetric_key_path: symmetric_key.or(base.symmetric_key_path),
    }
}

/// Files written by [`write_key_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFiles {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
    pub symmetric_key: Option<PathBuf>,
}

impl KeyFiles {
    /// Configuration pointing at these files.
    pub fn config(&self, algorithm: Algorithm) -> KeyConfig {
        KeyConfig {
            algorithm,
            private_key_path: self.private_key.clone(),
            public_key_path: self.public_key.clone(),
            symmetric_key_path: self.symmetric_key.clone(),
        }
    }
}

/// Generates a key pair (and optionally a symmetric key) into `dir`.
///
/// Existing files are only replaced when `force` is set.
pub fn write_key_files(
    dir: &Path,
    algorithm: Algorithm,
    with_symmetric: bool,
    force: bool,
) -> Result<KeyFiles> {
    let files = KeyFiles {
        private_key: dir.join(PRIVATE_KEY_FILE),
        public_key: dir.join(PUBLIC_KEY_FILE),
        symmetric_key: with_symmetric.then(|| dir.join(SYMMETRIC_KEY_FILE)),
    };

    if !force {
        let existing = [Some(&files.private_key), Some(&files.public_key), files.symmetric_key.as_ref()]
            .into_iter()
            .flatten()
            .find(|path| path.exists());
        if let Some(path) = existing {
            bail!("{} already exists; pass --force to overwrite", path.display());
        }
    }

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let private_key = PrivateKey::generate(algorithm).context("Failed to generate key pair")?;
    let private_pem = private_key.to_pkcs8_pem().context("Failed to encode private key")?;
    let public_pem = private_key
        .public_key()
        .to_public_key_pem()
        .context("Failed to encode public key")?;

    write_secret(&files.private_key, private_pem.as_bytes(), force)?;
    fs::write(&files.public_key, public_pem)
        .with_context(|| format!("Failed to write {}", files.public_key.display()))?;
    if let Some(path) = &files.symmetric_key {
        write_secret(path, generate_random_key().as_bytes(), force)?;
    }

    Ok(files)
}

/// Writes `contents` to a file readable only by its owner. On Unix the mode
/// is set when the file is created, and an overwritten file is restricted
/// before any new bytes land in it.
fn write_secret(path: &Path, contents: &[u8], force: bool) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }
    file.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// What `validate` prints.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub verdict: LicenseVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<LicenseClaims>,
}

impl ValidationReport {
    /// Attaches claims only to usable verdicts.
    pub fn new(verdict: LicenseVerdict, claims: Option<LicenseClaims>) -> Self {
        Self {
            verdict,
            claims: claims.filter(|_| verdict.is_usable()),
        }
    }
}
