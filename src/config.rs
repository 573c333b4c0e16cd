//! Store Configuration Module
//!
//! This module provides [`StoreConfig`], the single configuration entry point
//! for [`Store`](crate::Store). A configuration is fixed once the store is
//! built; the store exposes it again through `max_size()` and `lifetime()`.
//!
//! # Parameters
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `max_size` | Maximum number of entries retained. `0` is legal: every insert is evicted immediately. |
//! | `expiry` | Expiry policy. [`Eternal`] never expires; [`Ttl`] applies one lifetime to every entry. |
//!
//! The expiry policy is part of the configuration's type, so a store that
//! never expires and one that does are distinct types chosen at compile time.
//!
//! # Examples
//!
//! ```
//! use bounded_kv::config::StoreConfig;
//! use bounded_kv::Store;
//! use std::time::Duration;
//!
//! // 1000 entries, no expiry
//! let config = StoreConfig::new(1000);
//! let store: Store<String, i32> = Store::init(config, None);
//! assert_eq!(store.lifetime(), None);
//!
//! // 1000 entries, each living 30 seconds after its last write
//! let config = StoreConfig::new(1000).with_lifetime(Duration::from_secs(30));
//! let store: Store<String, i32, _> = Store::init(config, None);
//! assert_eq!(store.lifetime(), Some(Duration::from_secs(30)));
//! ```

use crate::clock::{Clock, SystemClock};
use crate::expiry::{Eternal, Expiry, Ttl};
use core::fmt;
use std::time::Duration;

/// Configuration for a [`Store`](crate::Store).
///
/// # Fields
///
/// - `max_size`: Maximum number of entries the store retains. Inserting past
///   it evicts the least recently written entry.
/// - `expiry`: Expiry policy applied to every entry.
///
/// # Examples
///
/// ```
/// use bounded_kv::config::StoreConfig;
/// use bounded_kv::{Eternal, ManualClock};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let config = StoreConfig { max_size: 64, expiry: Eternal };
/// assert_eq!(config.lifetime(), None);
///
/// let clock = Arc::new(ManualClock::new());
/// let config = StoreConfig::new(64).with_lifetime_and_clock(Duration::from_secs(1), clock);
/// assert_eq!(config.lifetime(), Some(Duration::from_secs(1)));
/// ```
#[derive(Clone, Copy)]
pub struct StoreConfig<E = Eternal> {
    /// Maximum number of entries the store retains.
    pub max_size: usize,
    /// Expiry policy applied to every entry.
    pub expiry: E,
}

impl StoreConfig<Eternal> {
    /// Creates a configuration for a store that never expires entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        StoreConfig {
            max_size,
            expiry: Eternal,
        }
    }
}

impl<E> StoreConfig<E> {
    /// Gives every entry a fixed lifetime measured on the system clock.
    #[must_use]
    pub fn with_lifetime(self, lifetime: Duration) -> StoreConfig<Ttl<SystemClock>> {
        StoreConfig {
            max_size: self.max_size,
            expiry: Ttl::new(lifetime),
        }
    }

    /// Gives every entry a fixed lifetime measured on `clock`.
    #[must_use]
    pub fn with_lifetime_and_clock<C: Clock>(
        self,
        lifetime: Duration,
        clock: C,
    ) -> StoreConfig<Ttl<C>> {
        StoreConfig {
            max_size: self.max_size,
            expiry: Ttl::with_clock(lifetime, clock),
        }
    }
}

impl<E: Expiry> StoreConfig<E> {
    /// Returns the lifetime applied to each entry, if entries expire.
    #[inline]
    pub fn lifetime(&self) -> Option<Duration> {
        self.expiry.lifetime()
    }
}

impl<E: Expiry> fmt::Debug for StoreConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("max_size", &self.max_size)
            .field("lifetime", &self.expiry.lifetime())
            .finish()
    }
}
