//! Bounded Store
//!
//! A thread-safe key-value store with a fixed maximum number of entries,
//! recency-based eviction, optional expiry and a compare-and-swap primitive.
//!
//! # How It Works
//!
//! One [`Segment`](crate::segment) holds the recency list and the lookup
//! index. A single `parking_lot::Mutex` guards it, and every operation,
//! including the read-only ones, runs under that lock. Operations are
//! therefore linearizable for the whole store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                       Mutex                            │  │
//! │  │  ┌──────────────────┐        ┌─────────────────────┐   │  │
//! │  │  │  index           │ handle │ recency list        │   │  │
//! │  │  │  key ──▶ Handle  │───────▶│ newest ... oldest   │   │  │
//! │  │  └──────────────────┘        └─────────────────────┘   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Recency
//!
//! Only writes refresh an entry's position. `insert` (and a successful
//! `compare_exchange`) moves the key to the front; `find`, `first`, `last`
//! and `map` never reorder anything. When a write pushes the store past
//! `max_size`, the entry at the back, the one written longest ago, is
//! evicted.
//!
//! # Expiry
//!
//! With a [`Ttl`] policy each write stamps the entry with
//! `now + lifetime`. Expired entries are removed lazily by a sweep from the
//! back of the list, which runs before `insert`, `last`, `len` and
//! `is_empty`, and after `erase`. `find`, `first`, `map` and `dump` do not
//! sweep; they simply treat expired entries as absent. There is no
//! background task.
//!
//! | Operation | Sweeps | Reorders |
//! |-----------|--------|----------|
//! | `insert` | before | yes |
//! | `compare_exchange` | before write | on success |
//! | `find`, `find_with`, `first` | no | no |
//! | `last`, `len`, `is_empty`, `stats` | before | no |
//! | `erase` | after | no |
//! | `map`, `map_mut`, `dump` | no (stop at first expired) | no |
//!
//! # Returned Values
//!
//! Values are returned as clones. Nothing handed to a caller aliases the
//! store's storage, so later writes from other threads can never be observed
//! through an earlier result. Use [`Store::find_with`] to inspect a value in
//! place without cloning it.
//!
//! # Example
//!
//! ```
//! use bounded_kv::Store;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let store = Arc::new(Store::new(1000));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let store = Arc::clone(&store);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 store.insert(t * 100 + i, i);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(store.len(), 400);
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::expiry::{Eternal, Expiry, Ttl};
use crate::metrics::{CacheMetrics, StoreMetrics};
use crate::segment::Segment;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// A bounded, thread-safe key-value store with recency-based eviction.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq`; writes also need `Clone`
///   because the lookup index keeps its own copy of each key.
/// - `V`: Value type. Reads that return values need `Clone`;
///   `compare_exchange` needs `PartialEq`.
/// - `E`: Expiry policy, [`Eternal`] (default) or [`Ttl`].
/// - `S`: Hash builder for the lookup index.
///
/// # Examples
///
/// ```
/// use bounded_kv::Store;
///
/// let store = Store::new(4);
/// store.insert(1, "10");
/// store.insert(2, "20");
/// store.insert(3, "30");
///
/// store.insert(2, "22");
/// assert_eq!(store.len(), 3);
/// assert_eq!(store.find(&2), Some("22"));
/// assert_eq!(store.first(), Some("22"));
///
/// store.insert(4, "40");
/// store.insert(5, "50");
/// assert_eq!(store.len(), 4);
/// assert_eq!(store.find(&1), None);
/// ```
pub struct Store<K, V, E: Expiry = Eternal, S = DefaultHashBuilder> {
    segment: Mutex<Segment<K, V, E, S>>,
    max_size: usize,
    lifetime: Option<Duration>,
}

impl<K: Hash + Eq, V> Store<K, V, Eternal, DefaultHashBuilder> {
    /// Creates an empty store holding at most `max_size` entries that never
    /// expire.
    ///
    /// A `max_size` of 0 is allowed; such a store evicts every entry as soon
    /// as it is inserted.
    pub fn new(max_size: usize) -> Self {
        Self::init(StoreConfig::new(max_size), None)
    }
}

impl<K: Hash + Eq, V> Store<K, V, Ttl<SystemClock>, DefaultHashBuilder> {
    /// Creates an empty store whose entries expire `lifetime` after their
    /// last write, measured on the system clock.
    pub fn with_lifetime(max_size: usize, lifetime: Duration) -> Self {
        Self::init(StoreConfig::new(max_size).with_lifetime(lifetime), None)
    }
}

impl<K: Hash + Eq, V, C: Clock> Store<K, V, Ttl<C>, DefaultHashBuilder> {
    /// Creates an empty store whose entries expire `lifetime` after their
    /// last write, measured on `clock`.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_kv::{ManualClock, Store};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let clock = Arc::new(ManualClock::new());
    /// let store = Store::with_lifetime_and_clock(8, Duration::from_secs(1), Arc::clone(&clock));
    ///
    /// store.insert("session", 7);
    /// assert_eq!(store.find("session"), Some(7));
    ///
    /// clock.advance(Duration::from_secs(1));
    /// assert_eq!(store.find("session"), None);
    /// ```
    pub fn with_lifetime_and_clock(max_size: usize, lifetime: Duration, clock: C) -> Self {
        Self::init(
            StoreConfig::new(max_size).with_lifetime_and_clock(lifetime, clock),
            None,
        )
    }
}

impl<K: Hash + Eq, V, E: Expiry> Store<K, V, E, DefaultHashBuilder> {
    /// Creates a store from a configuration with an optional hasher.
    ///
    /// # Arguments
    ///
    /// * `config` - Maximum size and expiry policy
    /// * `hasher` - Optional hash builder. If `None`, uses `DefaultHashBuilder`
    pub fn init(config: StoreConfig<E>, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }

    /// Rebuilds a store from a newest-first sequence of pairs, such as the
    /// output of [`dump`](Self::dump).
    ///
    /// The pairs are written through the normal insert path, oldest first,
    /// so the result has the same recency order as the sequence. If the
    /// sequence holds more than `config.max_size` distinct keys, only the
    /// newest `max_size` survive. With an expiry policy every restored entry
    /// gets a fresh deadline.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_kv::config::StoreConfig;
    /// use bounded_kv::Store;
    ///
    /// let store = Store::new(10);
    /// store.insert("a", 1);
    /// store.insert("b", 2);
    ///
    /// let copy = Store::restore(store.dump(), StoreConfig::new(10));
    /// assert_eq!(copy.dump(), vec![("b", 2), ("a", 1)]);
    /// ```
    pub fn restore<I>(entries: I, config: StoreConfig<E>) -> Self
    where
        K: Clone,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: DoubleEndedIterator,
    {
        let store = Self::init(config, None);
        {
            let mut segment = store.segment.lock();
            segment.replay(entries);
            debug!(
                restored = segment.stored(),
                max_size = segment.max_size(),
                "restored store from snapshot"
            );
        }
        store
    }
}

impl<K, V, E, S> Store<K, V, E, S>
where
    K: Hash + Eq,
    E: Expiry,
    S: BuildHasher,
{
    /// Creates a store from a configuration with a custom hash builder.
    pub fn init_with_hasher(config: StoreConfig<E>, hash_builder: S) -> Self {
        let lifetime = config.lifetime();
        Store {
            segment: Mutex::new(Segment::with_hasher(
                config.max_size,
                config.expiry,
                hash_builder,
            )),
            max_size: config.max_size,
            lifetime,
        }
    }

    /// Returns the maximum number of entries the store retains.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the lifetime given to each entry, or `None` if entries never
    /// expire.
    #[inline]
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Returns the number of live entries.
    ///
    /// Expired entries are swept first, so they never inflate the count.
    pub fn len(&self) -> usize {
        self.segment.lock().len()
    }

    /// Returns `true` if the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.segment.lock().is_empty()
    }

    /// Inserts or updates a key, making it the most recent entry.
    ///
    /// If the store then holds more than `max_size` entries, the least
    /// recently written one is evicted and returned. With `max_size == 0`
    /// the returned entry is the one just inserted.
    pub fn insert(&self, key: K, value: V) -> Option<(K, V)>
    where
        K: Clone,
    {
        self.segment.lock().insert(key, value)
    }

    /// Returns a clone of the live value for `key`.
    ///
    /// Lookups do not change recency order.
    pub fn find<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.segment.lock().find(key).cloned()
    }

    /// Applies `f` to the live value for `key` while holding the lock.
    ///
    /// Avoids cloning the value. `f` must not call back into the store.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_kv::Store;
    ///
    /// let store = Store::new(4);
    /// store.insert("greeting", String::from("hello world"));
    /// assert_eq!(store.find_with("greeting", |v| v.len()), Some(11));
    /// ```
    pub fn find_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.segment.lock().find(key).map(f)
    }

    /// Returns a clone of the most recently written live value.
    pub fn first(&self) -> Option<V>
    where
        V: Clone,
    {
        self.segment.lock().first().cloned()
    }

    /// Returns a clone of the least recently written live value.
    pub fn last(&self) -> Option<V>
    where
        V: Clone,
    {
        self.segment.lock().last().cloned()
    }

    /// Removes `key` if present.
    ///
    /// Returns the removed value if the entry was live. For expiring stores
    /// the expiry sweep runs afterwards.
    pub fn erase<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().erase(key)
    }

    /// Removes every entry.
    ///
    /// This cannot fail: the lock never poisons and releasing entries
    /// involves no fallible step.
    pub fn clear(&self) {
        self.segment.lock().clear();
    }

    /// Removes expired entries now and returns how many were removed.
    ///
    /// Always returns 0 for a store that never expires.
    pub fn purge_expired(&self) -> usize {
        self.segment.lock().purge_expired()
    }

    /// Calls `f` on every live entry, newest first.
    ///
    /// The lock is held for the whole traversal, so a slow visitor blocks
    /// every other operation on the store. `f` must not call back into the
    /// store; doing so deadlocks. Formatting the store with `{:?}` is the
    /// exception, since `Debug` reads only the fixed configuration.
    ///
    /// For expiring stores the traversal stops at the first expired entry;
    /// every entry after it is older and therefore expired too.
    pub fn map<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        self.segment.lock().map(f);
    }

    /// Calls `f` on every live entry, newest first, with mutable access to
    /// the value.
    ///
    /// Mutating a value this way does not refresh its position, its
    /// deadline, or trigger eviction. The same locking caveats as
    /// [`map`](Self::map) apply.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_kv::Store;
    ///
    /// let store = Store::new(4);
    /// store.insert(1, 10);
    /// store.insert(2, 20);
    /// store.map_mut(|_, v| *v *= 2);
    /// assert_eq!(store.dump(), vec![(2, 40), (1, 20)]);
    /// ```
    pub fn map_mut<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V),
    {
        self.segment.lock().map_mut(f);
    }

    /// Returns a consistent snapshot of the live entries, newest first.
    pub fn dump(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.segment.lock().dump()
    }

    /// Single-attempt compare-and-swap.
    ///
    /// If the live value for `key` equals `expected` (both absent counts as
    /// equal), writes `desired` exactly as [`insert`](Self::insert) would and
    /// returns `true`, leaving `expected` untouched. Otherwise sets
    /// `expected` to the live value (or `None`) and returns `false`, so the
    /// caller can retry straight away.
    ///
    /// # Example
    ///
    /// ```
    /// use bounded_kv::Store;
    ///
    /// let store = Store::new(4);
    /// store.insert("hits", 0);
    ///
    /// // optimistic increment
    /// let mut expected = store.find("hits");
    /// loop {
    ///     let desired = expected.unwrap_or(0) + 1;
    ///     if store.compare_exchange("hits", desired, &mut expected) {
    ///         break;
    ///     }
    /// }
    /// assert_eq!(store.find("hits"), Some(1));
    /// ```
    pub fn compare_exchange(&self, key: K, desired: V, expected: &mut Option<V>) -> bool
    where
        K: Clone,
        V: PartialEq + Clone,
    {
        self.segment
            .lock()
            .compare_exchange(key, desired, expected)
    }

    /// Returns a snapshot of the store's counters.
    ///
    /// Expired entries are swept first, so `len` and `utilization` count
    /// only live entries.
    pub fn stats(&self) -> StoreMetrics {
        self.segment.lock().metrics()
    }
}

impl<K, V, E, S> CacheMetrics for Store<K, V, E, S>
where
    K: Hash + Eq,
    E: Expiry,
    S: BuildHasher,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.stats().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "RECENCY"
    }
}

/// Reports the fixed configuration only. Formatting never takes the lock,
/// so it is safe from inside a `map` or `find_with` closure.
impl<K, V, E: Expiry, S> fmt::Debug for Store<K, V, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("max_size", &self.max_size)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
