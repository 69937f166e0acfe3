//! Webhook alert sink.
//!
//! POSTs one JSON report per committed mismatch denial to a configured
//! endpoint (an internal alerting service that turns reports into operator
//! email). The license key is masked down to its tail so reports don't leak
//! a usable secret into the alert pipeline.

use crate::error::{NotifyError, NotifyResult};
use crate::Notifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keywarden_core::LicenseRecord;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How many trailing key characters survive masking.
const KEY_TAIL_LEN: usize = 4;

/// Report body sent to the alert sink.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MismatchReport {
    holder: String,
    license_key_tail: String,
    request_ip: IpAddr,
    bound_ip: Option<IpAddr>,
    software: Option<String>,
    failure_count: u32,
    blocked_until: Option<DateTime<Utc>>,
    reported_at: DateTime<Utc>,
}

/// Delivers mismatch reports to an HTTP endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    /// Creates a notifier posting to the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn build_report(
        record: &LicenseRecord,
        request_ip: IpAddr,
        software: Option<&str>,
    ) -> MismatchReport {
        MismatchReport {
            holder: record.holder.clone(),
            license_key_tail: mask_key(&record.license_key),
            request_ip,
            bound_ip: record.last_activation.map(|b| b.ip),
            software: software.map(str::to_string),
            failure_count: record.failure_count,
            blocked_until: record.blocked_until,
            reported_at: Utc::now(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        record: &LicenseRecord,
        request_ip: IpAddr,
        software: Option<&str>,
    ) -> NotifyResult<()> {
        let report = Self::build_report(record, request_ip, software);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        debug!(holder = %record.holder, %request_ip, "mismatch alert delivered");
        Ok(())
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(KEY_TAIL_LEN)..]
        .iter()
        .collect();
    format!("...{tail}")
}
