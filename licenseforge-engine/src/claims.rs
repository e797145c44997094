//! License claims: the facts a license asserts.
//!
//! Claims are immutable once built. A changed claim set means a new license,
//! never an edit of an existing one.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Duration, Months, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Validity length applied when a builder is given no `not_after`.
pub const DEFAULT_VALIDITY_MONTHS: u32 = 12;

/// The signed payload of a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseClaims {
    customer_id: String,
    #[serde(default)]
    modules: BTreeMap<String, bool>,
    #[serde(default)]
    features: BTreeSet<String>,
    #[serde(with = "timestamp")]
    not_before: DateTime<Utc>,
    #[serde(with = "timestamp")]
    not_after: DateTime<Utc>,
    #[serde(default)]
    machine_id: String,
    #[serde(default)]
    grace_period_days: u32,
    #[serde(default)]
    limits: BTreeMap<String, u64>,
}

impl LicenseClaims {
    /// Starts building claims for `customer_id`.
    pub fn builder(customer_id: impl Into<String>) -> LicenseClaimsBuilder {
        LicenseClaimsBuilder {
            customer_id: customer_id.into(),
            ..LicenseClaimsBuilder::default()
        }
    }

    /// Checks the claim invariants: a non-empty customer,
    /// `not_before <= not_after`, and a grace deadline that stays within the
    /// representable time range.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.customer_id.trim().is_empty() {
            return Err(LicenseError::InvalidClaims(
                "customer id must not be empty".to_string(),
            ));
        }
        if self.not_before > self.not_after {
            return Err(LicenseError::InvalidClaims(format!(
                "not_before {} is after not_after {}",
                timestamp::format(&self.not_before),
                timestamp::format(&self.not_after)
            )));
        }
        if self.checked_grace_deadline().is_none() {
            return Err(LicenseError::InvalidClaims(format!(
                "grace period of {} days runs past the supported time range",
                self.grace_period_days
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    #[must_use]
    pub fn modules(&self) -> &BTreeMap<String, bool> {
        &self.modules
    }

    /// Returns true if the named module is present and enabled.
    #[must_use]
    pub fn is_module_enabled(&self, name: &str) -> bool {
        self.modules.get(name).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains(name)
    }

    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    #[must_use]
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    #[must_use]
    pub fn grace_period_days(&self) -> u32 {
        self.grace_period_days
    }

    /// Returns the last instant at which the license is still accepted.
    /// Saturates at the latest representable instant.
    #[must_use]
    pub fn grace_deadline(&self) -> DateTime<Utc> {
        self.checked_grace_deadline()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn checked_grace_deadline(&self) -> Option<DateTime<Utc>> {
        self.not_after
            .checked_add_signed(Duration::days(i64::from(self.grace_period_days)))
    }

    #[must_use]
    pub fn limits(&self) -> &BTreeMap<String, u64> {
        &self.limits
    }

    #[must_use]
    pub fn limit(&self, name: &str) -> Option<u64> {
        self.limits.get(name).copied()
    }
}

/// Builder for [`LicenseClaims`].
///
/// Insertion order of modules, features and limits never matters.
#[derive(Debug, Clone, Default)]
pub struct LicenseClaimsBuilder {
    customer_id: String,
    modules: BTreeMap<String, bool>,
    features: BTreeSet<String>,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
    machine_id: String,
    grace_period_days: u32,
    limits: BTreeMap<String, u64>,
}

impl LicenseClaimsBuilder {
    pub fn module(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.modules.insert(name.into(), enabled);
        self
    }

    pub fn feature(mut self, name: impl Into<String>) -> Self {
        self.features.insert(name.into());
        self
    }

    pub fn features<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the start of the validity window. Any timezone is accepted and
    /// normalised to UTC.
    pub fn not_before<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.not_before = Some(at.with_timezone(&Utc));
        self
    }

    /// Sets the end of the validity window.
    pub fn not_after<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.not_after = Some(at.with_timezone(&Utc));
        self
    }

    pub fn machine_id(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = machine_id.into();
        self
    }

    pub fn grace_period_days(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    pub fn limit(mut self, name: impl Into<String>, value: u64) -> Self {
        self.limits.insert(name.into(), value);
        self
    }

    /// Builds the claims, defaulting a missing window relative to now.
    pub fn build(self) -> LicenseResult<LicenseClaims> {
        self.build_at(Utc::now())
    }

    /// Builds the claims, defaulting `not_before` to `now` and `not_after`
    /// to [`DEFAULT_VALIDITY_MONTHS`] after `not_before`. Timestamps are
    /// truncated to whole seconds.
    pub fn build_at(self, now: DateTime<Utc>) -> LicenseResult<LicenseClaims> {
        let not_before = self.not_before.unwrap_or(now).trunc_subsecs(0);
        let not_after = match self.not_after {
            Some(at) => at.trunc_subsecs(0),
            None => not_before
                .checked_add_months(Months::new(DEFAULT_VALIDITY_MONTHS))
                .ok_or_else(|| {
                    LicenseError::InvalidClaims("validity window out of range".to_string())
                })?,
        };

        let claims = LicenseClaims {
            customer_id: self.customer_id,
            modules: self.modules,
            features: self.features,
            not_before,
            not_after,
            machine_id: self.machine_id,
            grace_period_days: self.grace_period_days,
            limits: self.limits,
        };
        claims.validate()?;
        Ok(claims)
    }
}

/// The single textual timestamp form used on the wire and in the canonical
/// encoding: UTC, whole seconds, `Z` suffix.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    #[must_use]
    pub fn format(at: &DateTime<Utc>) -> String {
        at.format(FORMAT).to_string()
    }

    pub fn parse(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(input, FORMAT).map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
