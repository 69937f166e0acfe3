use keywarden_core::BoundedLog;

#[test]
fn push_keeps_insertion_order() {
    let mut log = BoundedLog::new(5);
    log.push(1);
    log.push(2);
    log.push(3);
    assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(log.last(), Some(&3));
}

#[test]
fn push_at_capacity_evicts_oldest() {
    let mut log = BoundedLog::new(3);
    for n in 0..10 {
        log.push(n);
    }
    assert_eq!(log.len(), 3);
    assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec![7, 8, 9]);
}

#[test]
fn zero_capacity_log_stays_empty() {
    let mut log = BoundedLog::new(0);
    log.push("entry");
    assert!(log.is_empty());
    assert_eq!(log.last(), None);
}

#[test]
fn push_distinct_skips_consecutive_duplicates_only() {
    let mut log = BoundedLog::new(5);
    assert!(log.push_distinct("a"));
    assert!(!log.push_distinct("a"));
    assert!(log.push_distinct("b"));
    assert!(log.push_distinct("a"));
    assert_eq!(log.iter().copied().collect::<Vec<_>>(), vec!["a", "b", "a"]);
}

#[test]
fn serde_round_trip_preserves_capacity_and_entries() {
    let mut log = BoundedLog::new(4);
    log.push(10);
    log.push(20);

    let json = serde_json::to_string(&log).unwrap();
    let back: BoundedLog<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, log);
    assert_eq!(back.capacity(), 4);

    // Eviction still works on the deserialized log.
    let mut back = back;
    for n in 0..10 {
        back.push(n);
    }
    assert_eq!(back.len(), 4);
}
