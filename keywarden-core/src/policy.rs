//! The lockout decision function.
//!
//! [`evaluate`] is the whole policy: given a record, the current time, the
//! requesting origin and the requested software, it produces a terminal
//! decision plus the record state to commit (if the check mutated anything).
//! It performs no I/O; callers own reading the record, committing the
//! mutation atomically and dispatching mismatch notifications.

use crate::record::LicenseRecord;
use chrono::{DateTime, Duration, Utc};
use std::net::IpAddr;

/// Hours after the last activation during which a different origin is treated
/// as a sharing attempt. At or past this window a new origin rebinds freely.
pub const GRACE_WINDOW_HOURS: i64 = 24;

/// Cap on the lockout escalation, in days.
pub const MAX_LOCKOUT_DAYS: u32 = 7;

/// Terminal outcome of a verification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Check passed; the license may be used.
    Allowed,
    /// No record matches the presented key.
    NotFound,
    /// The requested software is not in the license's entitlement set.
    SoftwareDenied,
    /// A lockout window is in force; carries its end.
    Blocked { until: DateTime<Utc> },
    /// The license has passed its hard expiry.
    Expired,
    /// Origin differed from the bound origin inside the grace window.
    /// The caller must trigger a notification after committing the mutation.
    DeniedIpMismatch,
}

/// A decision plus the record state to commit, if the check mutated anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    pub mutation: Option<LicenseRecord>,
}

impl Evaluation {
    fn unchanged(decision: Decision) -> Self {
        Self {
            decision,
            mutation: None,
        }
    }
}

/// Evaluates a verification check against a license record.
///
/// Checks are applied in order, first match wins: entitlement, active block,
/// expiry, then origin. The origin step distinguishes three paths:
///
/// - same (or first) origin: accept, rebind if needed
/// - different origin within [`GRACE_WINDOW_HOURS`] of the last activation:
///   mismatch event: failure recorded, lockout escalated
/// - different origin at or past the window: legitimate re-binding, no penalty
///
/// `requested_software` of `None` means no entitlement check was requested.
#[must_use]
pub fn evaluate(
    record: &LicenseRecord,
    now: DateTime<Utc>,
    request_ip: IpAddr,
    requested_software: Option<&str>,
) -> Evaluation {
    if let Some(software) = requested_software {
        if !record.allows_software(software) {
            return Evaluation::unchanged(Decision::SoftwareDenied);
        }
    }

    if let Some(until) = record.active_block(now) {
        return Evaluation::unchanged(Decision::Blocked { until });
    }

    if record.is_expired(now) {
        return Evaluation::unchanged(Decision::Expired);
    }

    if let Some(binding) = record.last_activation {
        if binding.ip != request_ip && now - binding.at < Duration::hours(GRACE_WINDOW_HOURS) {
            let mut updated = record.clone();
            updated.record_mismatch(request_ip, now);
            return Evaluation {
                decision: Decision::DeniedIpMismatch,
                mutation: Some(updated),
            };
        }
        if binding.ip == request_ip {
            // Already bound to this origin; nothing to commit.
            return Evaluation::unchanged(Decision::Allowed);
        }
    }

    // First activation, or re-binding past the grace window.
    let mut updated = record.clone();
    updated.rebind(request_ip, now);
    Evaluation {
        decision: Decision::Allowed,
        mutation: Some(updated),
    }
}
