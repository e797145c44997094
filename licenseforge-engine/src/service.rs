//! The issuing service: the engine wired to its persistence collaborators.

use crate::claims::LicenseClaims;
use crate::engine::{IssuedLicense, LicenseEngine, LicenseVerdict};
use crate::error::{LicenseError, LicenseResult};
use crate::key_string::LicenseKeyString;
use crate::repository::{CustomerRepository, LicenseRepository};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub struct LicenseService<C, L> {
    engine: LicenseEngine,
    customers: C,
    licenses: L,
}

impl<C, L> LicenseService<C, L>
where
    C: CustomerRepository,
    L: LicenseRepository,
{
    pub fn new(engine: LicenseEngine, customers: C, licenses: L) -> Self {
        Self {
            engine,
            customers,
            licenses,
        }
    }

    pub fn engine(&self) -> &LicenseEngine {
        &self.engine
    }

    pub fn customers(&self) -> &C {
        &self.customers
    }

    pub fn licenses(&self) -> &L {
        &self.licenses
    }

    /// Issues a license for a known customer and stores it.
    ///
    /// # Errors
    /// [`LicenseError::CustomerNotFound`] for an unknown customer, plus
    /// anything [`LicenseEngine::issue`] or the repository returns.
    pub fn issue(&self, claims: LicenseClaims, encrypt: bool) -> LicenseResult<IssuedLicense> {
        if !self.customers.exists(claims.customer_id())? {
            warn!(customer = %claims.customer_id(), "refusing to issue for unknown customer");
            return Err(LicenseError::CustomerNotFound(claims.customer_id().to_string()));
        }

        let issued = self.engine.issue(claims, encrypt)?;
        self.licenses.save(&issued.key, &issued.artifact)?;
        Ok(issued)
    }

    /// Looks up a stored license and validates it against the current time.
    pub fn validate_by_key(&self, key: &LicenseKeyString) -> LicenseVerdict {
        self.validate_by_key_at(key, Utc::now())
    }

    /// Looks up a stored license and validates it against `now`. Unknown
    /// keys and lookup failures are `Invalid`.
    pub fn validate_by_key_at(&self, key: &LicenseKeyString, now: DateTime<Utc>) -> LicenseVerdict {
        match self.licenses.find_by_key(key) {
            Ok(Some(artifact)) => self.engine.validate_at(&artifact, now),
            Ok(None) => {
                debug!(license = %key, "no stored license under key");
                LicenseVerdict::Invalid
            }
            Err(reason) => {
                warn!(license = %key, %reason, "license lookup failed");
                LicenseVerdict::Invalid
            }
        }
    }
}
