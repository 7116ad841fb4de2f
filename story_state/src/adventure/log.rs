//! Capacity-limited ring buffer used for every history the engine persists.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A ring buffer that drops its oldest entries once full.
///
/// Deserializing a log longer than its recorded capacity truncates it. The
/// recorded capacity itself comes from the blob, so owners re-impose their own
/// limit with [`BoundedLog::set_capacity`] after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLog<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct BoundedLog<T> {
    capacity: usize,
    items: VecDeque<T>,
}

#[derive(Deserialize)]
struct RawLog<T> {
    capacity: usize,
    #[serde(default = "VecDeque::new")]
    items: VecDeque<T>,
}

impl<T> From<RawLog<T>> for BoundedLog<T> {
    fn from(raw: RawLog<T>) -> Self {
        let mut log = BoundedLog::new(raw.capacity);
        for item in raw.items {
            log.push(item);
        }
        log
    }
}

impl<T> BoundedLog<T> {
    /// Create an empty log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::new(),
        }
    }

    /// Append an entry, evicting the oldest if full.
    pub fn push(&mut self, item: T) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Replace the capacity (minimum 1), dropping the oldest entries that no
    /// longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The most recent `n` entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().rev().take(n)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
