//! Human-typable license key strings.
//!
//! A key string is a lookup handle for a stored license. It carries no
//! authenticity; that comes from the signature inside the artifact.

use crate::error::{LicenseError, LicenseResult};
use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbols a key string is drawn from.
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const GROUP_COUNT: usize = 5;
pub const GROUP_LEN: usize = 5;

/// Length of a key string including separators.
pub const KEY_STRING_LEN: usize = GROUP_COUNT * GROUP_LEN + GROUP_COUNT - 1;

/// A license key string of the form `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKeyString(String);

impl LicenseKeyString {
    /// Generates a new key string from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let mut out = String::with_capacity(KEY_STRING_LEN);
        for group in 0..GROUP_COUNT {
            if group > 0 {
                out.push('-');
            }
            for _ in 0..GROUP_LEN {
                out.push(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
            }
        }
        Self(out)
    }

    /// Parses a key string, ignoring surrounding whitespace and letter case.
    pub fn parse(input: &str) -> LicenseResult<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        if !is_well_formed(&normalized) {
            return Err(LicenseError::InvalidKeyString(format!(
                "expected {GROUP_COUNT} groups of {GROUP_LEN} characters from A-Z0-9"
            )));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == KEY_STRING_LEN
        && candidate.split('-').count() == GROUP_COUNT
        && candidate
            .split('-')
            .all(|group| group.len() == GROUP_LEN && group.bytes().all(|b| ALPHABET.contains(&b)))
}

impl fmt::Display for LicenseKeyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKeyString {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKeyString {
    type Error = LicenseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LicenseKeyString> for String {
    fn from(key: LicenseKeyString) -> Self {
        key.0
    }
}

impl AsRef<str> for LicenseKeyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
