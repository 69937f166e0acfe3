//! Mismatch alert delivery for KeyWarden.
//!
//! When a verification check is denied because the key was presented from a
//! different origin inside the grace window, the service reports the event
//! through a [`Notifier`]. Delivery is best-effort: the verification response
//! never waits on it, and a failed delivery is logged and dropped, not
//! retried.

mod error;
mod webhook;

pub use error::{NotifyError, NotifyResult};
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use keywarden_core::LicenseRecord;
use std::net::IpAddr;
use tracing::debug;

/// Best-effort sink for mismatch denial reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Reports one committed mismatch denial.
    ///
    /// `record` is the post-mutation record (failure count and block window
    /// already escalated); `request_ip` is the origin that was denied.
    async fn notify(
        &self,
        record: &LicenseRecord,
        request_ip: IpAddr,
        software: Option<&str>,
    ) -> NotifyResult<()>;
}

/// Notifier that drops every report. Used when no alert sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(
        &self,
        record: &LicenseRecord,
        request_ip: IpAddr,
        _software: Option<&str>,
    ) -> NotifyResult<()> {
        debug!(
            holder = %record.holder,
            %request_ip,
            "mismatch alert dropped (no sink configured)"
        );
        Ok(())
    }
}
