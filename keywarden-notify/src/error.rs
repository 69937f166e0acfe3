//! Error types for alert delivery.

use thiserror::Error;

/// Result type for notifier operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur delivering a mismatch alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("alert delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The alert sink answered with a non-success status.
    #[error("alert sink rejected the report with status {0}")]
    Rejected(u16),
}
