//! The unsynchronized storage engine behind [`Store`](crate::Store).
//!
//! A [`Segment`] owns two structures that are kept in lockstep:
//!
//! - a recency [`List`] of entries, newest at the front, which owns every
//!   key, value and deadline;
//! - a lookup index mapping each key to the [`Handle`] of its list slot.
//!
//! ```text
//!   index: HashMap<K, Handle>           list (arena-backed, newest first)
//!   ┌─────────┬────────┐
//!   │ key "c" │ slot 2 │──────────▶  [slot 2: c] ◀─▶ [slot 0: a] ◀─▶ [slot 1: b]
//!   │ key "a" │ slot 0 │──────────▶        ▲                                ▲
//!   │ key "b" │ slot 1 │──────────▶      front                            back
//!   └─────────┴────────┘                                          (evicted first)
//! ```
//!
//! All algorithm logic lives here; the store only adds the lock. After every
//! public method returns:
//!
//! 1. `list.len() <= max_size`
//! 2. `list.len() == index.len()`
//! 3. every index handle names a list entry bearing the same key
//! 4. the list is ordered by recency of last write
//! 5. expired entries, if any, form a contiguous run at the back

use crate::entry::Entry;
use crate::expiry::Expiry;
use crate::list::{Handle, List};
use crate::metrics::StoreMetrics;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use tracing::{debug, trace};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Upper bound on the number of slots reserved up front.
const PREALLOCATE_LIMIT: usize = 4096;

pub(crate) struct Segment<K, V, E: Expiry, S> {
    max_size: usize,
    expiry: E,
    list: List<Entry<K, V, E::Deadline>>,
    index: HashMap<K, Handle, S>,
    metrics: StoreMetrics,
}

impl<K, V, E: Expiry, S> Segment<K, V, E, S> {
    #[inline]
    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of stored entries, including any expired ones not yet swept.
    #[inline]
    pub(crate) fn stored(&self) -> usize {
        self.list.len()
    }
}

impl<K, V, E, S> Segment<K, V, E, S>
where
    K: Hash + Eq,
    E: Expiry,
    S: BuildHasher,
{
    pub(crate) fn with_hasher(max_size: usize, expiry: E, hash_builder: S) -> Self {
        let reserved = max_size.min(PREALLOCATE_LIMIT);
        Segment {
            max_size,
            expiry,
            list: List::with_capacity(reserved),
            index: HashMap::with_capacity_and_hasher(reserved, hash_builder),
            metrics: StoreMetrics::new(max_size),
        }
    }

    /// Number of live entries. Sweeps expired entries first.
    pub(crate) fn len(&mut self) -> usize {
        self.purge_expired();
        self.list.len()
    }

    pub(crate) fn is_empty(&mut self) -> bool {
        self.purge_expired();
        self.list.is_empty()
    }

    /// Counter snapshot. Sweeps first so `len` counts only live entries.
    pub(crate) fn metrics(&mut self) -> StoreMetrics {
        self.purge_expired();
        let mut metrics = self.metrics.clone();
        metrics.len = self.list.len() as u64;
        metrics
    }

    #[inline]
    fn check_invariants(&self) {
        debug_assert_eq!(self.list.len(), self.index.len());
        debug_assert!(self.list.len() <= self.max_size);
    }

    /// Removes expired entries from the back of the list.
    ///
    /// Stops at the first live entry: expired entries can only sit behind it.
    fn sweep(&mut self, now: E::Now) -> usize {
        let mut removed = 0;
        while let Some(entry) = self.list.back() {
            if !self.expiry.is_expired(&entry.deadline, now) {
                break;
            }
            if let Some(entry) = self.list.pop_back() {
                self.index.remove(&entry.key);
                removed += 1;
            }
        }

        if removed > 0 {
            self.metrics.expirations += removed as u64;
            debug!(
                removed,
                remaining = self.list.len(),
                "swept expired entries"
            );
        }
        removed
    }

    /// Sweeps expired entries and returns how many were removed.
    pub(crate) fn purge_expired(&mut self) -> usize {
        let now = self.expiry.now();
        let removed = self.sweep(now);
        self.check_invariants();
        removed
    }

    /// Drops the back entry, returning its key and value.
    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let entry = self.list.pop_back()?;
        self.index.remove(&entry.key);
        self.metrics.evictions += 1;
        trace!(len = self.list.len(), "evicted least recently written entry");
        Some(entry.into_pair())
    }

    /// Returns the handle of the live entry for `key`, if any.
    fn live_handle<Q>(&self, key: &Q, now: E::Now) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let handle = *self.index.get(key)?;
        let entry = self.list.get(handle)?;
        debug_assert!(<K as Borrow<Q>>::borrow(&entry.key) == key);
        if self.expiry.is_expired(&entry.deadline, now) {
            None
        } else {
            Some(handle)
        }
    }

    fn insert_at(&mut self, key: K, value: V, now: E::Now) -> Option<(K, V)>
    where
        K: Clone,
    {
        self.sweep(now);
        let deadline = self.expiry.deadline(now);

        if let Some(&handle) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(handle) {
                entry.value = value;
                entry.deadline = deadline;
            }
            self.list.move_to_front(handle);
            self.metrics.updates += 1;
        } else {
            let handle = self
                .list
                .push_front(Entry::new(key.clone(), value, deadline));
            self.index.insert(key, handle);
            self.metrics.insertions += 1;
        }

        let evicted = if self.list.len() > self.max_size {
            self.evict_oldest()
        } else {
            None
        };
        self.check_invariants();
        evicted
    }

    /// Inserts or updates `key`, moving it to the front.
    ///
    /// Returns the entry evicted to stay within `max_size`, if any. With
    /// `max_size == 0` that is the entry just written.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<(K, V)>
    where
        K: Clone,
    {
        let now = self.expiry.now();
        self.insert_at(key, value, now)
    }

    /// Looks up the live value for `key` without changing recency order.
    pub(crate) fn find<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = self.expiry.now();
        let handle = self.live_handle(key, now);
        self.metrics.record_lookup(handle.is_some());
        handle
            .and_then(|handle| self.list.get(handle))
            .map(|entry| &entry.value)
    }

    /// Newest live value. Does not sweep.
    pub(crate) fn first(&self) -> Option<&V> {
        let now = self.expiry.now();
        self.list
            .front()
            .filter(|entry| !self.expiry.is_expired(&entry.deadline, now))
            .map(|entry| &entry.value)
    }

    /// Oldest live value. Sweeps expired entries first.
    pub(crate) fn last(&mut self) -> Option<&V> {
        self.purge_expired();
        self.list.back().map(|entry| &entry.value)
    }

    /// Removes `key`, then sweeps expired entries.
    ///
    /// Returns the removed value if the entry was still live.
    pub(crate) fn erase<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = self.expiry.now();
        let removed = self
            .index
            .remove(key)
            .and_then(|handle| self.list.remove(handle));

        let value = match removed {
            Some(entry) if self.expiry.is_expired(&entry.deadline, now) => {
                self.metrics.expirations += 1;
                None
            }
            Some(entry) => {
                self.metrics.removals += 1;
                Some(entry.value)
            }
            None => None,
        };

        self.sweep(now);
        self.check_invariants();
        value
    }

    pub(crate) fn clear(&mut self) {
        let dropped = self.list.len();
        self.index.clear();
        self.list.clear();
        debug!(dropped, "cleared store");
    }

    /// Visits live entries newest first, stopping at the first expired one.
    pub(crate) fn map<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let now = self.expiry.now();
        for entry in self.list.iter() {
            if self.expiry.is_expired(&entry.deadline, now) {
                break;
            }
            f(&entry.key, &entry.value);
        }
    }

    /// Like [`map`](Self::map), with mutable access to each value.
    pub(crate) fn map_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        let now = self.expiry.now();
        let expiry = &self.expiry;
        self.list.walk_mut(|entry| {
            if expiry.is_expired(&entry.deadline, now) {
                return false;
            }
            f(&entry.key, &mut entry.value);
            true
        });
    }

    /// Copies the live entries out, newest first.
    pub(crate) fn dump(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.list.len());
        self.map(|key, value| out.push((key.clone(), value.clone())));
        out
    }

    /// Replays a newest-first sequence through the normal insert path.
    ///
    /// Entries are written oldest first so the newest ends up at the front;
    /// when the sequence is longer than `max_size` the oldest are evicted.
    pub(crate) fn replay<I>(&mut self, entries: I)
    where
        K: Clone,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: DoubleEndedIterator,
    {
        for (key, value) in entries.into_iter().rev() {
            self.insert(key, value);
        }
    }

    /// Single-attempt compare-and-swap.
    ///
    /// Writes `desired` if the live value for `key` equals `expected` (both
    /// absent counts as equal). Otherwise refreshes `expected` with the live
    /// value, or `None` if there is none.
    pub(crate) fn compare_exchange(&mut self, key: K, desired: V, expected: &mut Option<V>) -> bool
    where
        K: Clone,
        V: PartialEq + Clone,
    {
        let now = self.expiry.now();
        let current = self
            .live_handle(&key, now)
            .and_then(|handle| self.list.get(handle))
            .map(|entry| &entry.value);

        if current == expected.as_ref() {
            self.insert_at(key, desired, now);
            self.metrics.cas_successes += 1;
            true
        } else {
            *expected = current.cloned();
            self.metrics.cas_failures += 1;
            false
        }
    }
}

impl<K, V, E: Expiry, S> fmt::Debug for Segment<K, V, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("max_size", &self.max_size)
            .field("len", &self.list.len())
            .field("lifetime", &self.expiry.lifetime())
            .finish()
    }
}
