//! In-memory license store.
//!
//! Compare-and-set runs under a single write lock, so it gives the same
//! per-key serialization guarantee as the SQLite store. Used by tests and by
//! ephemeral deployments that don't want a database file.

use crate::error::{StoreError, StoreResult};
use crate::{CommitOutcome, LicenseStore, VersionedRecord};
use async_trait::async_trait;
use keywarden_core::LicenseRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store for license records.
#[derive(Default)]
pub struct MemoryLicenseStore {
    records: RwLock<HashMap<String, VersionedRecord>>,
}

impl MemoryLicenseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn get_by_key(&self, license_key: &str) -> StoreResult<Option<VersionedRecord>> {
        Ok(self.records.read().await.get(license_key).cloned())
    }

    async fn conditional_write(
        &self,
        record: &LicenseRecord,
        expected_revision: u64,
    ) -> StoreResult<CommitOutcome> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.license_key) {
            Some(stored) if stored.revision == expected_revision => {
                stored.record = record.clone();
                stored.revision = expected_revision + 1;
                Ok(CommitOutcome::Committed)
            }
            _ => Ok(CommitOutcome::Conflict),
        }
    }

    async fn insert(&self, record: &LicenseRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.values().any(|v| v.record.holder == record.holder) {
            return Err(StoreError::DuplicateHolder(record.holder.clone()));
        }
        records.insert(
            record.license_key.clone(),
            VersionedRecord {
                record: record.clone(),
                revision: 1,
            },
        );
        Ok(())
    }
}
