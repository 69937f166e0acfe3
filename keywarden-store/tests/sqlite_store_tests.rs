use chrono::{Duration, Utc};
use keywarden_core::LicenseRecord;
use keywarden_store::{CommitOutcome, LicenseStore, SqliteLicenseStore, StoreError};
use std::collections::BTreeSet;

fn make_record(key: &str, holder: &str) -> LicenseRecord {
    LicenseRecord::new(
        key,
        holder,
        BTreeSet::new(),
        Utc::now() + Duration::days(365),
    )
}

#[tokio::test]
async fn insert_and_get_round_trip() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let rec = make_record("key-1", "a@example.com");
    store.insert(&rec).await.unwrap();

    let stored = store.get_by_key("key-1").await.unwrap().unwrap();
    assert_eq!(stored.record, rec);
    assert_eq!(stored.revision, 1);
}

#[tokio::test]
async fn get_missing_returns_none() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    assert!(store.get_by_key("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn conditional_write_bumps_revision() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let rec = make_record("key-1", "a@example.com");
    store.insert(&rec).await.unwrap();

    let mut updated = rec.clone();
    updated.rebind("1.1.1.1".parse().unwrap(), Utc::now());
    let outcome = store.conditional_write(&updated, 1).await.unwrap();
    assert_eq!(outcome, CommitOutcome::Committed);

    let stored = store.get_by_key("key-1").await.unwrap().unwrap();
    assert_eq!(stored.revision, 2);
    assert_eq!(stored.record.ip_history.len(), 1);
}

#[tokio::test]
async fn stale_revision_is_a_conflict_and_writes_nothing() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let rec = make_record("key-1", "a@example.com");
    store.insert(&rec).await.unwrap();

    let mut first = rec.clone();
    first.rebind("1.1.1.1".parse().unwrap(), Utc::now());
    assert_eq!(
        store.conditional_write(&first, 1).await.unwrap(),
        CommitOutcome::Committed
    );

    // A writer still holding revision 1 must lose.
    let mut second = rec.clone();
    second.rebind("2.2.2.2".parse().unwrap(), Utc::now());
    assert_eq!(
        store.conditional_write(&second, 1).await.unwrap(),
        CommitOutcome::Conflict
    );

    let stored = store.get_by_key("key-1").await.unwrap().unwrap();
    assert_eq!(stored.revision, 2);
    assert_eq!(
        stored.record.last_activation.unwrap().ip,
        "1.1.1.1".parse::<std::net::IpAddr>().unwrap()
    );
}

#[tokio::test]
async fn conditional_write_on_missing_key_is_a_conflict() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let rec = make_record("ghost", "g@example.com");
    assert_eq!(
        store.conditional_write(&rec, 1).await.unwrap(),
        CommitOutcome::Conflict
    );
}

#[tokio::test]
async fn duplicate_holder_is_rejected() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    store
        .insert(&make_record("key-1", "a@example.com"))
        .await
        .unwrap();

    let err = store
        .insert(&make_record("key-2", "a@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateHolder(h) if h == "a@example.com"));
}

#[tokio::test]
async fn mutated_lockout_state_persists() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let rec = make_record("key-1", "a@example.com");
    store.insert(&rec).await.unwrap();

    let mut updated = rec.clone();
    updated.rebind("1.1.1.1".parse().unwrap(), Utc::now() - Duration::hours(1));
    updated.record_mismatch("2.2.2.2".parse().unwrap(), Utc::now());
    store.conditional_write(&updated, 1).await.unwrap();

    let stored = store.get_by_key("key-1").await.unwrap().unwrap();
    assert_eq!(stored.record.failure_count, 1);
    assert_eq!(stored.record.failure_history.len(), 1);
    assert!(stored.record.blocked_until.is_some());
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licenses.db");

    {
        let store = SqliteLicenseStore::new(&path).unwrap();
        store
            .insert(&make_record("key-1", "a@example.com"))
            .await
            .unwrap();
    }

    let store = SqliteLicenseStore::new(&path).unwrap();
    let stored = store.get_by_key("key-1").await.unwrap().unwrap();
    assert_eq!(stored.record.holder, "a@example.com");
    assert_eq!(stored.revision, 1);
}
