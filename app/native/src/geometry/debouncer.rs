//! Generic debouncer for event handling.
//!
//! This module provides a reusable debouncer that delays processing of
//! rapid events until they settle. The sync engine uses it to coalesce
//! viewport move/resize bursts before recomputing overlay brightness,
//! which requires a costly pixel read-back.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A generic debouncer that tracks pending items and drains settled ones.
///
/// Items are tracked by key; an item only settles after it has been
/// stable for the configured settle time. Re-touching a key restarts its
/// settle window.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    /// Pending items waiting to settle.
    pending: HashMap<K, PendingItem<V>>,
    /// How long items must be stable before being returned.
    settle_time: Duration,
}

/// A pending item tracked by the debouncer.
#[derive(Debug, Clone)]
struct PendingItem<V> {
    value: V,
    last_updated: Instant,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new debouncer with the specified settle time.
    #[must_use]
    pub fn new(settle_time: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            settle_time,
        }
    }

    /// Updates or inserts a pending item.
    ///
    /// Returns `true` if this is a new item (not already pending).
    pub fn update(&mut self, key: K, value: V) -> bool {
        let is_new = !self.pending.contains_key(&key);

        self.pending.insert(key, PendingItem { value, last_updated: Instant::now() });

        is_new
    }

    /// Checks if there are any pending items.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    /// Gets the number of pending items.
    #[must_use]
    pub fn len(&self) -> usize { self.pending.len() }

    /// Returns the earliest instant at which a pending item settles, so
    /// callers can schedule a wake-up instead of polling.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|item| item.last_updated + self.settle_time)
            .min()
    }

    /// Drains all items that have been stable for the settle time.
    ///
    /// Returns a vector of (key, value) pairs for settled items.
    pub fn drain_settled(&mut self) -> Vec<(K, V)> {
        let now = Instant::now();

        let settled: Vec<(K, V)> = self
            .pending
            .iter()
            .filter(|(_, item)| now.duration_since(item.last_updated) >= self.settle_time)
            .map(|(k, item)| (k.clone(), item.value.clone()))
            .collect();

        for (key, _) in &settled {
            self.pending.remove(key);
        }

        settled
    }

    /// Clears all pending items.
    pub fn clear(&mut self) { self.pending.clear(); }
}

/// A simpler debouncer for cases where only keys are tracked.
pub type KeyDebouncer<K> = Debouncer<K, ()>;

impl<K> Debouncer<K, ()>
where K: Eq + Hash + Clone
{
    /// Updates or inserts a pending key (no value).
    ///
    /// Returns `true` if this is a new key (not already pending).
    pub fn touch(&mut self, key: K) -> bool { self.update(key, ()) }

    /// Drains all keys that have settled.
    pub fn drain_settled_keys(&mut self) -> Vec<K> {
        self.drain_settled().into_iter().map(|(k, ())| k).collect()
    }
}
