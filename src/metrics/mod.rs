//! Store Metrics
//!
//! Counters describing what a [`Store`](crate::Store) has done since it was
//! built, reported through the [`CacheMetrics`] trait as a `BTreeMap`.
//!
//! # Why BTreeMap over HashMap?
//!
//! Metrics are reported in a deterministic, alphabetical order so that logs,
//! test assertions and exported snapshots stay reproducible from run to run.
//! With a dozen keys the cost of an ordered map is irrelevant.
//!
//! # Reported keys
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `lookups` | `find`/`find_with` calls |
//! | `hits` / `misses` | lookups that found / did not find a live entry |
//! | `hit_rate` / `miss_rate` | the above as fractions of `lookups` |
//! | `insertions` | writes that created a new key |
//! | `updates` | writes that replaced the value of an existing key |
//! | `evictions` | entries dropped because the store was over `max_size` |
//! | `expirations` | entries dropped by the expiry sweep |
//! | `removals` | live entries dropped by `erase` |
//! | `cas_successes` / `cas_failures` | `compare_exchange` outcomes |
//! | `len` / `max_size` | current and maximum entry counts |
//! | `utilization` | `len / max_size` (0.0 for a zero-sized store) |

use std::collections::BTreeMap;

/// Counters tracked by every store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Number of lookups performed.
    pub lookups: u64,

    /// Number of lookups that found a live entry.
    pub hits: u64,

    /// Number of writes that created a new key.
    pub insertions: u64,

    /// Number of writes that replaced the value of an existing key.
    pub updates: u64,

    /// Number of entries evicted to keep the store within `max_size`.
    pub evictions: u64,

    /// Number of entries removed by the expiry sweep.
    pub expirations: u64,

    /// Number of live entries removed by `erase`.
    pub removals: u64,

    /// Number of successful `compare_exchange` calls.
    pub cas_successes: u64,

    /// Number of failed `compare_exchange` calls.
    pub cas_failures: u64,

    /// Number of entries currently stored.
    pub len: u64,

    /// Maximum number of entries the store retains.
    pub max_size: u64,
}

impl StoreMetrics {
    /// Creates a zeroed set of counters for a store of the given size.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size as u64,
            ..Default::default()
        }
    }

    /// Records a lookup and whether it hit.
    #[inline]
    pub fn record_lookup(&mut self, hit: bool) {
        self.lookups += 1;
        if hit {
            self.hits += 1;
        }
    }

    /// Number of lookups that did not find a live entry.
    pub fn misses(&self) -> u64 {
        self.lookups - self.hits
    }

    /// Fraction of lookups that hit, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64
        } else {
            0.0
        }
    }

    /// Fraction of lookups that missed, or 0.0 before the first lookup.
    pub fn miss_rate(&self) -> f64 {
        if self.lookups > 0 {
            self.misses() as f64 / self.lookups as f64
        } else {
            0.0
        }
    }

    /// How full the store is relative to `max_size`.
    pub fn utilization(&self) -> f64 {
        if self.max_size > 0 {
            self.len as f64 / self.max_size as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a map with deterministic key order.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("lookups".to_string(), self.lookups as f64);
        metrics.insert("hits".to_string(), self.hits as f64);
        metrics.insert("misses".to_string(), self.misses() as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("updates".to_string(), self.updates as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("expirations".to_string(), self.expirations as f64);
        metrics.insert("removals".to_string(), self.removals as f64);

        metrics.insert("cas_successes".to_string(), self.cas_successes as f64);
        metrics.insert("cas_failures".to_string(), self.cas_failures as f64);

        metrics.insert("len".to_string(), self.len as f64);
        metrics.insert("max_size".to_string(), self.max_size as f64);
        metrics.insert("utilization".to_string(), self.utilization());

        metrics
    }
}

/// Uniform metrics reporting.
///
/// Implemented by [`Store`](crate::Store) so hosts can export its counters
/// without depending on the concrete counter struct.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short name of the eviction policy.
    fn algorithm_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zeroed() {
        let metrics = StoreMetrics::new(10);
        assert_eq!(metrics.max_size, 10);
        assert_eq!(metrics.lookups, 0);
        assert_eq!(metrics.hit_rate(), 0.0);
        assert_eq!(metrics.miss_rate(), 0.0);
        assert_eq!(metrics.utilization(), 0.0);
    }

    #[test]
    fn test_record_lookup() {
        let mut metrics = StoreMetrics::new(10);
        metrics.record_lookup(true);
        metrics.record_lookup(true);
        metrics.record_lookup(false);
        metrics.record_lookup(true);
        assert_eq!(metrics.lookups, 4);
        assert_eq!(metrics.hits, 3);
        assert_eq!(metrics.misses(), 1);
        assert_eq!(metrics.hit_rate(), 0.75);
        assert_eq!(metrics.miss_rate(), 0.25);
    }

    #[test]
    fn test_utilization_of_zero_sized_store() {
        let mut metrics = StoreMetrics::new(0);
        metrics.len = 0;
        assert_eq!(metrics.utilization(), 0.0);

        let mut metrics = StoreMetrics::new(4);
        metrics.len = 3;
        assert_eq!(metrics.utilization(), 0.75);
    }

    #[test]
    fn test_btreemap_keys_are_sorted() {
        let metrics = StoreMetrics::new(4).to_btreemap();
        let keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(metrics.len(), 15);
        assert_eq!(metrics.get("max_size"), Some(&4.0));
    }
}
