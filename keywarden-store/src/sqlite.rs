//! SQLite-backed license store.
//!
//! One row per license. The record itself is stored as a JSON blob; the
//! revision lives in its own column so the conditional write can be expressed
//! as a single guarded UPDATE, with the affected-row count deciding commit
//! vs. conflict.

use crate::error::{StoreError, StoreResult};
use crate::{CommitOutcome, LicenseStore, VersionedRecord};
use async_trait::async_trait;
use keywarden_core::LicenseRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Durable store for license records backed by SQLite.
pub struct SqliteLicenseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) a store at the given path.
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("failed to open license store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::Backend(format!("failed to open in-memory license store: {e}"))
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS licenses (
                license_key TEXT PRIMARY KEY,
                holder TEXT NOT NULL UNIQUE,
                record TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 1
            );
            ",
        )
        .map_err(|e| StoreError::Backend(format!("failed to init license schema: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // Lock poisoning only happens if a holder panicked; treat as fatal.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LicenseStore for SqliteLicenseStore {
    async fn get_by_key(&self, license_key: &str) -> StoreResult<Option<VersionedRecord>> {
        let conn = self.lock();
        let row: Option<(String, u64)> = conn
            .query_row(
                "SELECT record, revision FROM licenses WHERE license_key = ?1",
                params![license_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((json, revision)) => {
                let record: LicenseRecord = serde_json::from_str(&json)?;
                Ok(Some(VersionedRecord { record, revision }))
            }
            None => Ok(None),
        }
    }

    async fn conditional_write(
        &self,
        record: &LicenseRecord,
        expected_revision: u64,
    ) -> StoreResult<CommitOutcome> {
        let json = serde_json::to_string(record)?;
        let conn = self.lock();
        let affected = conn.execute(
            "UPDATE licenses SET record = ?1, revision = ?2
             WHERE license_key = ?3 AND revision = ?4",
            params![json, expected_revision + 1, record.license_key, expected_revision],
        )?;

        if affected == 1 {
            Ok(CommitOutcome::Committed)
        } else {
            debug!(
                license_key = %record.license_key,
                expected_revision,
                "conditional write lost the race"
            );
            Ok(CommitOutcome::Conflict)
        }
    }

    async fn insert(&self, record: &LicenseRecord) -> StoreResult<()> {
        let json = serde_json::to_string(record)?;
        let conn = self.lock();
        let result = conn.execute(
            "INSERT INTO licenses (license_key, holder, record, revision) VALUES (?1, ?2, ?3, 1)",
            params![record.license_key, record.holder, json],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                if let rusqlite::Error::SqliteFailure(e, _) = &err {
                    if e.code == rusqlite::ErrorCode::ConstraintViolation {
                        // The key is a fresh UUID, so a constraint hit means
                        // the holder column collided.
                        return Err(StoreError::DuplicateHolder(record.holder.clone()));
                    }
                }
                Err(err.into())
            }
        }
    }
}
