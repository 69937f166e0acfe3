//! The license record aggregate.
//!
//! One record per issued license. The record owns all per-license lockout
//! state; it is only mutated through the policy evaluation path, and the
//! mutating methods here uphold the record invariants (bounded histories,
//! non-decreasing failure count, monotone block window).

use crate::bounded_log::BoundedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Capacity of the mismatch and origin history logs.
pub const HISTORY_CAPACITY: usize = 50;

/// The origin a license is currently bound to, and when it was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationBinding {
    /// Most recent origin accepted.
    pub ip: IpAddr,
    /// When that origin was bound.
    pub at: DateTime<Utc>,
}

/// One issued license and its usage/lockout state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Opaque shared secret identifying the license. Immutable after creation.
    pub license_key: String,
    /// Licensee identifier (email). Unique across records; immutable.
    pub holder: String,
    /// Hard expiry.
    pub expires_at: DateTime<Utc>,
    /// Software identifiers this license entitles.
    pub allowed_software: BTreeSet<String>,
    /// Current origin binding, absent until first accepted check.
    pub last_activation: Option<ActivationBinding>,
    /// Count of IP-mismatch denials ever recorded. Only increases.
    pub failure_count: u32,
    /// Human-readable log of mismatch attempts, oldest evicted first.
    pub failure_history: BoundedLog<String>,
    /// Distinct consecutive accepted origins, oldest evicted first.
    pub ip_history: BoundedLog<IpAddr>,
    /// While set and in the future, every check is denied regardless of IP.
    pub blocked_until: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    /// Creates a fresh record with empty lockout state.
    #[must_use]
    pub fn new(
        license_key: impl Into<String>,
        holder: impl Into<String>,
        allowed_software: BTreeSet<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            license_key: license_key.into(),
            holder: holder.into(),
            expires_at,
            allowed_software,
            last_activation: None,
            failure_count: 0,
            failure_history: BoundedLog::new(HISTORY_CAPACITY),
            ip_history: BoundedLog::new(HISTORY_CAPACITY),
            blocked_until: None,
        }
    }

    /// Returns true if the license has passed its hard expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns the end of the active block window, if one is in force at `now`.
    #[must_use]
    pub fn active_block(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.blocked_until.filter(|until| now < *until)
    }

    /// Returns true if the record entitles the given software identifier.
    #[must_use]
    pub fn allows_software(&self, software: &str) -> bool {
        self.allowed_software.contains(software)
    }

    /// Binds the record to a new origin, recording it in the origin history.
    ///
    /// The origin history never holds two identical consecutive entries, so a
    /// rebind to the already-bound origin leaves it untouched.
    pub fn rebind(&mut self, ip: IpAddr, now: DateTime<Utc>) {
        self.last_activation = Some(ActivationBinding { ip, at: now });
        self.ip_history.push_distinct(ip);
    }

    /// Records a mismatch event: logs the attempt, bumps the failure count and
    /// escalates the block window.
    ///
    /// The block window never moves backwards: the new deadline is the later
    /// of the existing one and `now + min(failure_count, 7) days`.
    pub fn record_mismatch(&mut self, request_ip: IpAddr, now: DateTime<Utc>) {
        let entry = match self.last_activation {
            Some(binding) => format!(
                "{}: attempt from {} while bound to {} since {}",
                now.to_rfc3339(),
                request_ip,
                binding.ip,
                binding.at.to_rfc3339(),
            ),
            None => format!("{}: attempt from {}", now.to_rfc3339(), request_ip),
        };
        self.failure_history.push(entry);
        self.failure_count = self.failure_count.saturating_add(1);

        let lockout_days = i64::from(self.failure_count.min(crate::MAX_LOCKOUT_DAYS));
        let candidate = now + chrono::Duration::days(lockout_days);
        self.blocked_until = Some(match self.blocked_until {
            Some(existing) => existing.max(candidate),
            None => candidate,
        });
    }
}
