//! Shared test helpers for core tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use keywarden_core::{ActivationBinding, LicenseRecord};
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Fixed reference instant so every test is deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// A fresh record expiring a year past `base_time`, entitled to alpha/beta.
pub fn record() -> LicenseRecord {
    let software: BTreeSet<String> = ["alpha", "beta"].iter().map(|s| s.to_string()).collect();
    LicenseRecord::new(
        "key-0001",
        "holder@example.com",
        software,
        base_time() + Duration::days(365),
    )
}

/// A record bound to `bound_ip` the given number of hours before `base_time`.
pub fn bound_record(bound_ip: &str, hours_ago: i64) -> LicenseRecord {
    let mut rec = record();
    rec.last_activation = Some(ActivationBinding {
        ip: ip(bound_ip),
        at: base_time() - Duration::hours(hours_ago),
    });
    rec.ip_history.push(ip(bound_ip));
    rec
}
