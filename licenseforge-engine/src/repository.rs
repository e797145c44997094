//! Persistence collaborators.
//!
//! The engine never touches storage. These traits describe what an issuing
//! service needs from it; the in-memory implementations back tests and the
//! CLI.

use crate::artifact::LicenseArtifact;
use crate::error::{LicenseError, LicenseResult};
use crate::key_string::LicenseKeyString;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Source of truth for which customers exist.
pub trait CustomerRepository: Send + Sync {
    fn exists(&self, customer_id: &str) -> LicenseResult<bool>;
}

/// Storage for issued artifacts, keyed by license key string.
pub trait LicenseRepository: Send + Sync {
    /// Stores an artifact. Storing under a key that is already taken fails.
    fn save(&self, key: &LicenseKeyString, artifact: &LicenseArtifact) -> LicenseResult<()>;

    fn find_by_key(&self, key: &LicenseKeyString) -> LicenseResult<Option<LicenseArtifact>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCustomers {
    customers: RwLock<HashSet<String>>,
}

impl InMemoryCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            customers: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn insert(&self, customer_id: impl Into<String>) -> LicenseResult<()> {
        self.customers
            .write()
            .map_err(poisoned)?
            .insert(customer_id.into());
        Ok(())
    }
}

impl CustomerRepository for InMemoryCustomers {
    fn exists(&self, customer_id: &str) -> LicenseResult<bool> {
        Ok(self.customers.read().map_err(poisoned)?.contains(customer_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLicenses {
    licenses: RwLock<HashMap<LicenseKeyString, LicenseArtifact>>,
}

impl InMemoryLicenses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> LicenseResult<usize> {
        Ok(self.licenses.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> LicenseResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl LicenseRepository for InMemoryLicenses {
    fn save(&self, key: &LicenseKeyString, artifact: &LicenseArtifact) -> LicenseResult<()> {
        let mut licenses = self.licenses.write().map_err(poisoned)?;
        if licenses.contains_key(key) {
            return Err(LicenseError::Repository(format!("license {key} already stored")));
        }
        licenses.insert(key.clone(), artifact.clone());
        Ok(())
    }

    fn find_by_key(&self, key: &LicenseKeyString) -> LicenseResult<Option<LicenseArtifact>> {
        Ok(self.licenses.read().map_err(poisoned)?.get(key).cloned())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LicenseError {
    LicenseError::Repository("lock poisoned".to_string())
}
