//! Bounded append-only log with ring-buffer eviction.
//!
//! Backs the per-record mismatch and origin histories: appends past capacity
//! evict the oldest entry, so a record's history can never grow without bound.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A fixed-capacity log. Appending at capacity drops the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedLog<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> BoundedLog<T> {
    /// Creates an empty log with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends an entry, evicting the oldest if the log is full.
    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Returns the most recently appended entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Returns the number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: PartialEq> BoundedLog<T> {
    /// Appends an entry unless it equals the current last entry.
    ///
    /// Returns true if the entry was appended. Used for the origin history,
    /// which never holds two identical consecutive entries.
    pub fn push_distinct(&mut self, entry: T) -> bool {
        if self.last() == Some(&entry) {
            return false;
        }
        self.push(entry);
        true
    }
}
