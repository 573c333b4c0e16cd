#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Choosing an Expiry Policy
//!
//! | Policy | Constructor | Entries live until |
//! |--------|-------------|--------------------|
//! | [`Eternal`] | [`Store::new`] | evicted or erased |
//! | [`Ttl`] on [`SystemClock`] | [`Store::with_lifetime`] | `lifetime` after their last write |
//! | [`Ttl`] on any [`Clock`] | [`Store::with_lifetime_and_clock`] | same, on a clock you control |
//!
//! The policy is a type parameter, so a store that never expires carries no
//! deadline per entry and never reads the clock.
//!
//! ## Complexity
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `insert`, `find`, `erase`, `compare_exchange` | O(1) amortized, plus O(k) for k expired entries swept |
//! | `first`, `last`, `max_size`, `lifetime` | O(1) |
//! | `map`, `map_mut`, `dump` | O(n) |
//! | `restore` | O(n) |
//!
//! ## Bounded Store
//!
//! ```rust
//! use bounded_kv::Store;
//!
//! let store = Store::new(2);
//! store.insert("a", 1);
//! store.insert("b", 2);
//! store.find("a");           // lookups do not refresh recency
//! let evicted = store.insert("c", 3);
//! assert_eq!(evicted, Some(("a", 1)));
//! ```
//!
//! ## Expiring Store
//!
//! ```rust
//! use bounded_kv::{ManualClock, Store};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let store = Store::with_lifetime_and_clock(100, Duration::from_millis(500), Arc::clone(&clock));
//!
//! store.insert("token", "abc");
//! clock.advance(Duration::from_millis(499));
//! assert_eq!(store.find("token"), Some("abc"));
//!
//! clock.advance(Duration::from_millis(1));
//! assert_eq!(store.find("token"), None);
//! assert!(store.is_empty());
//! ```
//!
//! ## Snapshots
//!
//! ```rust
//! use bounded_kv::config::StoreConfig;
//! use bounded_kv::Store;
//!
//! let store = Store::new(3);
//! for (k, v) in [(1, "one"), (2, "two"), (3, "three")] {
//!     store.insert(k, v);
//! }
//!
//! let snapshot = store.dump();
//! assert_eq!(snapshot, vec![(3, "three"), (2, "two"), (1, "one")]);
//!
//! // a smaller store keeps only the newest entries
//! let small = Store::restore(snapshot, StoreConfig::new(2));
//! assert_eq!(small.dump(), vec![(3, "three"), (2, "two")]);
//! ```
//!
//! ## Metrics
//!
//! ```rust
//! use bounded_kv::{CacheMetrics, Store};
//!
//! let store = Store::new(10);
//! store.insert("k", 1);
//! store.find("k");
//! store.find("missing");
//!
//! let metrics = store.metrics();
//! assert_eq!(metrics["hits"], 1.0);
//! assert_eq!(metrics["misses"], 1.0);
//! assert_eq!(store.algorithm_name(), "RECENCY");
//! ```
//!
//! ## Modules
//!
//! - [`store`]: The thread-safe bounded store
//! - [`config`]: Store configuration
//! - [`expiry`]: Expiry policies
//! - [`clock`]: Time sources for expiring stores
//! - [`metrics`]: Counters and the metrics reporting trait

/// Time sources.
///
/// Provides the [`Clock`] trait, the monotonic [`SystemClock`] and the
/// manually advanced [`ManualClock`] used to drive expiry deterministically.
pub mod clock;

/// Store configuration.
pub mod config;

/// Key, value and deadline as owned by the recency list.
pub(crate) mod entry;

/// Expiry policies.
///
/// [`Eternal`] never expires entries; [`Ttl`] gives every entry the same
/// lifetime, renewed on each write.
pub mod expiry;

/// Arena-backed doubly linked list with stable handles.
///
/// Internal infrastructure for the recency order. Slots are addressed by
/// index, so there is no pointer juggling and no unsafe code.
pub(crate) mod list;

/// Store metrics.
///
/// Counters every store keeps and the [`CacheMetrics`] reporting trait.
pub mod metrics;

/// Unsynchronized storage engine: recency list plus lookup index.
pub(crate) mod segment;

/// The thread-safe bounded store.
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use expiry::{Eternal, Expiry, Ttl};
pub use metrics::{CacheMetrics, StoreMetrics};
pub use store::Store;
