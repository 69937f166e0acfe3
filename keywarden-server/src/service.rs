//! Verification orchestration.
//!
//! Turns the pure policy decision into a durable, concurrency-safe state
//! change: read the record, evaluate, attempt a revision-guarded commit,
//! retry on conflict, dispatch the mismatch alert after a committed denial.
//! Checks against different license keys run fully in parallel; checks
//! against the same key serialize through the store's compare-and-set.

use chrono::Utc;
use keywarden_core::{evaluate, Decision, LicenseRecord};
use keywarden_notify::Notifier;
use keywarden_store::{CommitOutcome, LicenseStore, StoreError};
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default bound on commit attempts before giving up.
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Result type for verification calls.
pub type VerifyResult = Result<Decision, VerifyError>;

/// Transient failures of the verification path.
///
/// These are never policy outcomes: a caller receiving one may retry the
/// whole check without duplicating any side effect.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The conditional commit kept losing races past the attempt budget.
    #[error("verification did not converge after {attempts} commit attempts")]
    RetryExhausted { attempts: u32 },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates license verification checks.
pub struct VerificationService {
    store: Arc<dyn LicenseStore>,
    notifier: Arc<dyn Notifier>,
    max_commit_attempts: u32,
}

impl VerificationService {
    /// Creates a service with the default commit-attempt budget.
    pub fn new(store: Arc<dyn LicenseStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Overrides the commit-attempt budget.
    #[must_use]
    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts;
        self
    }

    /// Runs one verification check.
    ///
    /// The read-evaluate-commit sequence is retried while the conditional
    /// write reports a lost race, re-reading the record each time so every
    /// attempt evaluates fresh state. Exhausting the budget is reported as
    /// [`VerifyError::RetryExhausted`], distinct from every policy decision.
    pub async fn verify(
        &self,
        license_key: &str,
        request_ip: IpAddr,
        software: Option<&str>,
    ) -> VerifyResult {
        for attempt in 1..=self.max_commit_attempts {
            let Some(versioned) = self.store.get_by_key(license_key).await? else {
                return Ok(Decision::NotFound);
            };

            let evaluation = evaluate(&versioned.record, Utc::now(), request_ip, software);

            let Some(updated) = evaluation.mutation else {
                return Ok(evaluation.decision);
            };

            match self
                .store
                .conditional_write(&updated, versioned.revision)
                .await?
            {
                CommitOutcome::Committed => {
                    if evaluation.decision == Decision::DeniedIpMismatch {
                        self.dispatch_alert(updated, request_ip, software);
                    }
                    return Ok(evaluation.decision);
                }
                CommitOutcome::Conflict => {
                    debug!(license_key, attempt, "commit conflict, re-evaluating");
                }
            }
        }

        warn!(
            license_key,
            attempts = self.max_commit_attempts,
            "verification retry budget exhausted"
        );
        Err(VerifyError::RetryExhausted {
            attempts: self.max_commit_attempts,
        })
    }

    /// Fires the mismatch alert off the request's critical path.
    ///
    /// One attempt per denial event; a failed delivery is logged and dropped.
    fn dispatch_alert(&self, record: LicenseRecord, request_ip: IpAddr, software: Option<&str>) {
        let notifier = Arc::clone(&self.notifier);
        let software = software.map(str::to_string);
        info!(
            holder = %record.holder,
            %request_ip,
            failure_count = record.failure_count,
            "mismatch denial committed, dispatching alert"
        );
        tokio::spawn(async move {
            if let Err(e) = notifier
                .notify(&record, request_ip, software.as_deref())
                .await
            {
                warn!(holder = %record.holder, "mismatch alert delivery failed: {e}");
            }
        });
    }
}
