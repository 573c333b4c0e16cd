//! Expiry policies.
//!
//! Whether a store expires entries is decided at compile time by its `E`
//! type parameter, which implements [`Expiry`]:
//!
//! | Policy | Deadline | Behaviour |
//! |--------|----------|-----------|
//! | [`Eternal`] | `()` | Entries live until evicted, erased or cleared |
//! | [`Ttl`] | `Option<Instant>` | Entries expire a fixed lifetime after their last write |
//!
//! `Eternal` is zero-sized and its deadline is `()`, so a non-expiring store
//! pays nothing for the expiry machinery: the sweep it runs before mutating
//! operations inspects the oldest entry once and stops.
//!
//! # Ordering
//!
//! Every write stamps its entry with `now + lifetime` and moves it to the
//! front of the recency list. With a monotonic clock and a single lifetime
//! shared by all entries, deadlines never decrease from the back of the list
//! to the front. Expired entries therefore always form a contiguous run at
//! the back, which lets the sweep stop at the first live entry it meets.

use crate::clock::{Clock, SystemClock};
use core::fmt;
use std::time::{Duration, Instant};

/// Capability trait selecting how (and whether) entries expire.
pub trait Expiry {
    /// Per-entry expiry stamp.
    type Deadline: Copy + fmt::Debug;

    /// A reading of the policy's time source.
    type Now: Copy;

    /// Reads the current time.
    fn now(&self) -> Self::Now;

    /// Computes the deadline of an entry written at `now`.
    fn deadline(&self, now: Self::Now) -> Self::Deadline;

    /// Returns true if an entry stamped with `deadline` is expired at `now`.
    ///
    /// An entry is expired once its deadline is reached, not only after it
    /// has passed.
    fn is_expired(&self, deadline: &Self::Deadline, now: Self::Now) -> bool;

    /// The lifetime applied to each entry, or `None` if entries never expire.
    fn lifetime(&self) -> Option<Duration>;
}

/// Policy for stores whose entries never expire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Eternal;

impl Expiry for Eternal {
    type Deadline = ();
    type Now = ();

    #[inline]
    fn now(&self) -> Self::Now {}

    #[inline]
    fn deadline(&self, _now: Self::Now) -> Self::Deadline {}

    #[inline]
    fn is_expired(&self, _deadline: &Self::Deadline, _now: Self::Now) -> bool {
        false
    }

    #[inline]
    fn lifetime(&self) -> Option<Duration> {
        None
    }
}

/// Policy expiring each entry a fixed lifetime after it was last written.
///
/// Deadlines that would overflow `Instant` are stored as `None` and never
/// expire.
///
/// # Example
///
/// ```
/// use bounded_kv::{Expiry, ManualClock, Ttl};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new());
/// let ttl = Ttl::with_clock(Duration::from_secs(10), Arc::clone(&clock));
///
/// let deadline = ttl.deadline(ttl.now());
/// clock.advance(Duration::from_secs(9));
/// assert!(!ttl.is_expired(&deadline, ttl.now()));
/// clock.advance(Duration::from_secs(1));
/// assert!(ttl.is_expired(&deadline, ttl.now()));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ttl<C = SystemClock> {
    lifetime: Duration,
    clock: C,
}

impl Ttl<SystemClock> {
    /// Creates a policy with the given lifetime on the system clock.
    pub fn new(lifetime: Duration) -> Self {
        Self::with_clock(lifetime, SystemClock)
    }
}

impl<C: Clock> Ttl<C> {
    /// Creates a policy with the given lifetime on a custom clock.
    pub fn with_clock(lifetime: Duration, clock: C) -> Self {
        Ttl { lifetime, clock }
    }

    /// Returns the clock this policy reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Expiry for Ttl<C> {
    type Deadline = Option<Instant>;
    type Now = Instant;

    #[inline]
    fn now(&self) -> Instant {
        self.clock.now()
    }

    #[inline]
    fn deadline(&self, now: Instant) -> Option<Instant> {
        now.checked_add(self.lifetime)
    }

    #[inline]
    fn is_expired(&self, deadline: &Option<Instant>, now: Instant) -> bool {
        matches!(deadline, Some(deadline) if *deadline <= now)
    }

    #[inline]
    fn lifetime(&self) -> Option<Duration> {
        Some(self.lifetime)
    }
}
