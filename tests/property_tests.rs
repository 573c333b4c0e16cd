//! Property-Based Tests for the Bounded Store
//!
//! Uses proptest to run random operation sequences against both the store
//! and a plain `Vec` model of the recency order, comparing them after every
//! step.

use bounded_kv::config::StoreConfig;
use bounded_kv::{ManualClock, Store};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

// == Strategies ==

#[derive(Debug, Clone)]
enum StoreOp {
    Insert { key: u8, value: u16 },
    Find { key: u8 },
    Erase { key: u8 },
    Cas { key: u8, expected: Option<u16>, desired: u16 },
    Clear,
}

fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..24
}

fn op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => (key_strategy(), any::<u16>()).prop_map(|(key, value)| StoreOp::Insert { key, value }),
        2 => key_strategy().prop_map(|key| StoreOp::Find { key }),
        1 => key_strategy().prop_map(|key| StoreOp::Erase { key }),
        2 => (key_strategy(), proptest::option::of(0u16..4), any::<u16>())
            .prop_map(|(key, expected, desired)| StoreOp::Cas { key, expected, desired }),
        1 => Just(StoreOp::Clear),
    ]
}

// == Model ==

/// Newest-first list of pairs with the same write semantics as the store.
#[derive(Debug, Default)]
struct Model {
    max_size: usize,
    entries: Vec<(u8, u16)>,
}

impl Model {
    fn new(max_size: usize) -> Self {
        Model {
            max_size,
            entries: Vec::new(),
        }
    }

    fn find(&self, key: u8) -> Option<u16> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn insert(&mut self, key: u8, value: u16) -> Option<(u8, u16)> {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.insert(0, (key, value));
        if self.entries.len() > self.max_size {
            self.entries.pop()
        } else {
            None
        }
    }

    fn erase(&mut self, key: u8) -> Option<u16> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every operation agrees with the model, and the size bound holds after
    // each step.
    #[test]
    fn prop_matches_model(
        max_size in 0usize..12,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let store: Store<u8, u16> = Store::new(max_size);
        let mut model = Model::new(max_size);

        for op in ops {
            match op {
                StoreOp::Insert { key, value } => {
                    prop_assert_eq!(store.insert(key, value), model.insert(key, value));
                }
                StoreOp::Find { key } => {
                    prop_assert_eq!(store.find(&key), model.find(key));
                }
                StoreOp::Erase { key } => {
                    prop_assert_eq!(store.erase(&key), model.erase(key));
                    prop_assert_eq!(store.find(&key), None);
                }
                StoreOp::Cas { key, expected, desired } => {
                    let mut store_expected = expected;
                    let swapped = store.compare_exchange(key, desired, &mut store_expected);
                    let current = model.find(key);
                    if current == expected {
                        prop_assert!(swapped);
                        prop_assert_eq!(store_expected, expected);
                        model.insert(key, desired);
                    } else {
                        prop_assert!(!swapped);
                        prop_assert_eq!(store_expected, current);
                    }
                }
                StoreOp::Clear => {
                    store.clear();
                    model.entries.clear();
                }
            }

            prop_assert!(store.len() <= max_size);
            prop_assert_eq!(store.len(), model.entries.len());
            prop_assert_eq!(store.first(), model.entries.first().map(|(_, v)| *v));
            prop_assert_eq!(store.last(), model.entries.last().map(|(_, v)| *v));
        }

        prop_assert_eq!(store.dump(), model.entries);
    }

    // Inserting max_size + 1 distinct keys evicts exactly the oldest one.
    #[test]
    fn prop_overflow_evicts_oldest(max_size in 1usize..32, start in 0u32..1000) {
        let store = Store::new(max_size);
        for i in 0..max_size as u32 {
            prop_assert_eq!(store.insert(start + i, i), None);
        }
        let evicted = store.insert(start + max_size as u32, 0);
        prop_assert_eq!(evicted, Some((start, 0)));
        prop_assert_eq!(store.len(), max_size);
    }

    // A snapshot restored into a store at least as large reproduces the
    // traversal; a smaller store keeps only the newest entries.
    #[test]
    fn prop_dump_restore(
        pairs in prop::collection::vec((key_strategy(), any::<u16>()), 0..40),
        max_size in 1usize..16,
        restore_size in 0usize..16,
    ) {
        let store = Store::new(max_size);
        for (k, v) in pairs {
            store.insert(k, v);
        }

        let snapshot = store.dump();
        let copy = Store::restore(snapshot.clone(), StoreConfig::new(restore_size));
        let kept = snapshot.len().min(restore_size);
        prop_assert_eq!(copy.dump(), snapshot[..kept].to_vec());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Expired entries are never visible, and the ones still live are a
    // newest-first prefix of the write order.
    #[test]
    fn prop_expiry_hides_old_writes(
        gaps in prop::collection::vec(0u64..40, 1..40),
        lifetime_ms in 1u64..100,
    ) {
        let clock = Arc::new(ManualClock::new());
        let lifetime = Duration::from_millis(lifetime_ms);
        let store = Store::with_lifetime_and_clock(64, lifetime, Arc::clone(&clock));

        let mut written_at = Vec::new();
        for (i, gap) in gaps.iter().enumerate() {
            clock.advance(Duration::from_millis(*gap));
            store.insert(i, clock.elapsed());
            written_at.push(clock.elapsed());
        }

        let now = clock.elapsed();
        let expected: Vec<usize> = (0..written_at.len())
            .rev()
            .take_while(|&i| written_at[i] + lifetime > now)
            .collect();

        let keys: Vec<usize> = store.dump().into_iter().map(|(k, _)| k).collect();
        prop_assert_eq!(&keys, &expected);
        prop_assert_eq!(store.len(), expected.len());
        for (i, at) in written_at.iter().enumerate() {
            let live = *at + lifetime > now;
            prop_assert_eq!(store.find(&i).is_some(), live);
        }
    }
}
