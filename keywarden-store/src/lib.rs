//! License record persistence for KeyWarden.
//!
//! Defines the [`LicenseStore`] interface the verification service commits
//! through, plus two implementations:
//!
//! - [`SqliteLicenseStore`]: durable, records stored as JSON rows
//! - [`MemoryLicenseStore`]: in-process, for tests and ephemeral deployments
//!
//! Writes are revision-guarded: every committed mutation increments the
//! record's revision, and a conditional write only lands if the stored
//! revision still matches the one the caller read. This is what makes the
//! read-evaluate-commit sequence for one license behave as if serialized.

mod error;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryLicenseStore;
pub use sqlite::SqliteLicenseStore;

use async_trait::async_trait;
use keywarden_core::LicenseRecord;

/// A record together with the revision it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedRecord {
    pub record: LicenseRecord,
    pub revision: u64,
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The write landed; the stored revision is now `expected_revision + 1`.
    Committed,
    /// The stored revision no longer matched; nothing was written.
    Conflict,
}

/// Keyed access to license records with compare-and-set writes.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Point read by license key. Returns the record and its current revision.
    async fn get_by_key(&self, license_key: &str) -> StoreResult<Option<VersionedRecord>>;

    /// Writes `record` only if the stored revision still equals
    /// `expected_revision`, incrementing the revision on success.
    async fn conditional_write(
        &self,
        record: &LicenseRecord,
        expected_revision: u64,
    ) -> StoreResult<CommitOutcome>;

    /// Inserts a freshly created record at revision 1.
    ///
    /// Fails with [`StoreError::DuplicateHolder`] if a record for the same
    /// holder already exists.
    async fn insert(&self, record: &LicenseRecord) -> StoreResult<()>;
}
