//! Store entry type.
//!
//! An [`Entry`] is what the recency list owns: the key, the value, and the
//! deadline assigned by the store's expiry policy. Non-expiring stores use
//! `()` as the deadline, so an entry is exactly a key and a value.

use core::fmt;

/// A key/value pair plus its expiry stamp.
pub(crate) struct Entry<K, V, D = ()> {
    /// The entry's key. The lookup index holds a copy of it.
    pub(crate) key: K,

    /// The stored value.
    pub(crate) value: V,

    /// When the entry expires, in the store's expiry policy's terms.
    pub(crate) deadline: D,
}

impl<K, V, D> Entry<K, V, D> {
    pub(crate) fn new(key: K, value: V, deadline: D) -> Self {
        Entry {
            key,
            value,
            deadline,
        }
    }

    /// Consumes the entry and returns its key and value.
    #[inline]
    pub(crate) fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, D: fmt::Debug> fmt::Debug for Entry<K, V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("deadline", &self.deadline)
            .finish()
    }
}
