//! Time sources for expiring stores.
//!
//! A store configured with a lifetime stamps each entry with a deadline taken
//! from a [`Clock`]. Two clocks are provided:
//!
//! - [`SystemClock`] reads the monotonic system clock (`Instant::now`).
//! - [`ManualClock`] is a logical clock that only moves when told to. It is
//!   meant for tests and simulations that need expiry to be deterministic.
//!
//! Clocks must never go backwards. The expiry sweep relies on deadlines being
//! ordered the same way as insertion recency, which only holds for a
//! monotonic time source.
//!
//! # Example
//!
//! ```
//! use bounded_kv::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now() - start, Duration::from_secs(5));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic source of the current time.
pub trait Clock {
    /// Returns the current instant. Successive calls never go backwards.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A logical clock advanced explicitly by the caller.
///
/// The clock is anchored at the instant it was created and keeps an offset
/// from that anchor. Advancing is lock-free, so a clock shared through an
/// [`Arc`] can be moved forward from one thread while stores read it from
/// others.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading the current system instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock reading `origin`.
    pub fn starting_at(origin: Instant) -> Self {
        ManualClock {
            origin,
            offset_nanos: AtomicU64::new(0),
        }
    }

    /// Moves the clock forward by `by`.
    ///
    /// The offset saturates at roughly 584 years past the origin.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let mut current = self.offset_nanos.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(by);
            match self.offset_nanos.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns how far the clock has been advanced since it was created.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::Acquire))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}
