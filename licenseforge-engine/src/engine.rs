//! Issuing and validating license artifacts.

use crate::artifact::{LicenseArtifact, SignedPackage};
use crate::claims::LicenseClaims;
use crate::error::{LicenseError, LicenseResult};
use crate::key_string::LicenseKeyString;
use crate::keys::KeyMaterial;
use crate::machine::MachineFingerprint;
use crate::signer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Outcome of validating an artifact.
///
/// Every cryptographic or structural failure is reported as `Invalid`,
/// whatever its cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LicenseVerdict {
    /// Inside the validity window.
    Valid,
    /// Past `not_after` but inside the grace period.
    ValidWithGrace {
        /// Whole days left before the license expires for good.
        days_remaining: u32,
    },
    /// Past the validity window and the grace period.
    Expired,
    /// Before `not_before`.
    NotYetValid,
    /// Authentic, but bound to another machine.
    MachineMismatch,
    /// Could not be decrypted, parsed or verified.
    Invalid,
}

impl LicenseVerdict {
    /// Classifies the time of `now` against the window of `claims`.
    #[must_use]
    pub fn at(claims: &LicenseClaims, now: DateTime<Utc>) -> Self {
        if now < claims.not_before() {
            return Self::NotYetValid;
        }
        if now <= claims.not_after() {
            return Self::Valid;
        }

        let deadline = claims.grace_deadline();
        if now <= deadline {
            let remaining = (deadline - now).num_seconds() / SECS_PER_DAY;
            return Self::ValidWithGrace {
                days_remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
            };
        }
        Self::Expired
    }

    /// Returns true if the license allows use (Valid or ValidWithGrace).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Valid | Self::ValidWithGrace { .. })
    }
}

/// A freshly issued license: its lookup handle and the artifact to hand out.
#[derive(Debug, Clone)]
pub struct IssuedLicense {
    pub key: LicenseKeyString,
    pub artifact: LicenseArtifact,
}

/// Signs, encrypts, decrypts and verifies licenses with one set of keys.
///
/// The engine holds no mutable state and is cheap to clone; clones share
/// the same key material.
#[derive(Debug, Clone)]
pub struct LicenseEngine {
    keys: Arc<KeyMaterial>,
}

impl LicenseEngine {
    pub fn new(keys: KeyMaterial) -> Self {
        Self { keys: Arc::new(keys) }
    }

    pub fn from_shared(keys: Arc<KeyMaterial>) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Signs `claims` and, if `encrypt` is set, encrypts the signed package.
    ///
    /// # Errors
    /// - [`LicenseError::InvalidClaims`] if the claims break an invariant.
    /// - [`LicenseError::Encoding`] if the claims cannot be canonically encoded.
    /// - [`LicenseError::CryptoOperation`] if the needed key is not loaded or
    ///   signing fails.
    pub fn issue(&self, claims: LicenseClaims, encrypt: bool) -> LicenseResult<IssuedLicense> {
        claims.validate()?;

        let private_key = self.keys.private_key().ok_or_else(|| {
            LicenseError::CryptoOperation("no private key loaded; cannot sign".to_string())
        })?;
        let signature = signer::sign(&claims, private_key)?;
        let customer_id = claims.customer_id().to_string();
        let package = SignedPackage::new(claims, signature);

        let artifact = if encrypt {
            let key = self.keys.symmetric_key().ok_or_else(|| {
                LicenseError::CryptoOperation("no symmetric key loaded; cannot encrypt".to_string())
            })?;
            LicenseArtifact::Encrypted(licenseforge_crypto::encrypt(key, &package.to_json_bytes()?))
        } else {
            LicenseArtifact::Signed(package)
        };

        let key = LicenseKeyString::generate();
        info!(license = %key, customer = %customer_id, encrypted = encrypt, "issued license");
        Ok(IssuedLicense { key, artifact })
    }

    /// Validates an artifact against the current time.
    pub fn validate(&self, artifact: &LicenseArtifact) -> LicenseVerdict {
        self.validate_at(artifact, Utc::now())
    }

    /// Validates an artifact against `now`.
    pub fn validate_at(&self, artifact: &LicenseArtifact, now: DateTime<Utc>) -> LicenseVerdict {
        self.inspect_at(artifact, None, now).0
    }

    /// Decodes a wire-form artifact and validates it against the current time.
    pub fn validate_wire(&self, input: &str) -> LicenseVerdict {
        self.validate_wire_at(input, Utc::now())
    }

    pub fn validate_wire_at(&self, input: &str, now: DateTime<Utc>) -> LicenseVerdict {
        match LicenseArtifact::from_wire(input) {
            Ok(artifact) => self.validate_at(&artifact, now),
            Err(reason) => invalid(&reason),
        }
    }

    /// Validates an artifact and additionally requires it to be bound to
    /// `machine`. An authentic license for another machine yields
    /// [`LicenseVerdict::MachineMismatch`].
    pub fn validate_for_machine(
        &self,
        artifact: &LicenseArtifact,
        machine: &MachineFingerprint,
    ) -> LicenseVerdict {
        self.validate_for_machine_at(artifact, machine, Utc::now())
    }

    pub fn validate_for_machine_at(
        &self,
        artifact: &LicenseArtifact,
        machine: &MachineFingerprint,
        now: DateTime<Utc>,
    ) -> LicenseVerdict {
        self.inspect_at(artifact, Some(machine), now).0
    }

    /// Validates an artifact against the current time and hands back the
    /// claims of an authentic license alongside the verdict.
    pub fn inspect(
        &self,
        artifact: &LicenseArtifact,
        machine: Option<&MachineFingerprint>,
    ) -> (LicenseVerdict, Option<LicenseClaims>) {
        self.inspect_at(artifact, machine, Utc::now())
    }

    /// Decrypts and verifies `artifact` once, then classifies it against
    /// `now` and, if given, `machine`. Claims are `None` exactly when the
    /// verdict is [`LicenseVerdict::Invalid`].
    pub fn inspect_at(
        &self,
        artifact: &LicenseArtifact,
        machine: Option<&MachineFingerprint>,
        now: DateTime<Utc>,
    ) -> (LicenseVerdict, Option<LicenseClaims>) {
        let claims = match self.open(artifact) {
            Ok(claims) => claims,
            Err(reason) => return (invalid(&reason), None),
        };

        let verdict = match machine {
            Some(machine) if !machine.matches(claims.machine_id()) => {
                info!(customer = %claims.customer_id(), "license bound to another machine");
                LicenseVerdict::MachineMismatch
            }
            _ => LicenseVerdict::at(&claims, now),
        };
        info!(customer = %claims.customer_id(), ?verdict, "validated license");
        (verdict, Some(claims))
    }

    /// Returns the claims of an authentic artifact, without looking at time.
    pub fn authenticate(&self, artifact: &LicenseArtifact) -> Option<LicenseClaims> {
        self.open(artifact)
            .map_err(|reason| debug!(%reason, "license rejected"))
            .ok()
    }

    /// Decrypts if needed, parses and verifies the signed package.
    fn open(&self, artifact: &LicenseArtifact) -> LicenseResult<LicenseClaims> {
        let package = match artifact {
            LicenseArtifact::Signed(package) => Cow::Borrowed(package),
            LicenseArtifact::Encrypted(blob) => {
                let key = self
                    .keys
                    .symmetric_key()
                    .ok_or_else(|| LicenseError::Decryption("no symmetric key loaded".to_string()))?;
                let plaintext = licenseforge_crypto::decrypt(key, blob)
                    .map_err(|e| LicenseError::Decryption(e.to_string()))?;
                Cow::Owned(SignedPackage::from_slice(&plaintext)?)
            }
        };

        if !signer::verify(package.claims(), package.signature(), self.keys.public_key())? {
            return Err(LicenseError::SignatureMismatch);
        }
        package.claims().validate()?;
        Ok(package.into_owned().into_claims())
    }
}

fn invalid(reason: &LicenseError) -> LicenseVerdict {
    debug!(%reason, "license rejected");
    LicenseVerdict::Invalid
}
