//! Bounded recent-id set for duplicate suppression.
//!
//! Delivery sources retry, and the live channel plus the reconnect-time
//! history fetch can both hand a consumer the same alert. Every dedup point
//! uses this set: the ingestion endpoint to drop redelivered webhooks, the
//! client to collapse history-fetch overlap.

use std::collections::{HashSet, VecDeque};

/// Maximum number of ids tracked before the set is shrunk.
const MAX_TRACKED: usize = 1000;

/// Number of newest ids kept when the set is shrunk.
const SHRINK_TO: usize = 500;

/// A bounded set of recently seen alert ids, oldest evicted first.
#[derive(Debug)]
pub struct RecentIds {
    capacity: usize,
    shrink_to: usize,
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl RecentIds {
    /// Create a set with the default bounds (1000, shrinking to 500).
    pub fn new() -> Self {
        Self::with_bounds(MAX_TRACKED, SHRINK_TO)
    }

    /// Create a set with explicit bounds. `shrink_to` must not exceed
    /// `capacity`; it is clamped if it does.
    pub fn with_bounds(capacity: usize, shrink_to: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            shrink_to: shrink_to.min(capacity).max(1),
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Record an id. Returns `true` if the id is new, `false` if it was
    /// already tracked (a duplicate).
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());

        if self.order.len() > self.capacity {
            while self.order.len() > self.shrink_to {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
        true
    }

    /// Whether the id is currently tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RecentIds {
    fn default() -> Self {
        Self::new()
    }
}
