//! Stress Tests for the Bounded Store
//!
//! These tests verify thread safety and correctness under high contention.

use bounded_kv::{CacheMetrics, ManualClock, Store};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NUM_THREADS: usize = 16;
const OPS_PER_THREAD: usize = 10_000;

/// Four writers fill disjoint quarters of a store exactly as large as the
/// key space; nothing may be lost or corrupted.
#[test]
fn stress_disjoint_writers_fill_exactly() {
    const MAX_COUNT: usize = 20_000;
    const VALUE_FACTOR: usize = 100;

    let store: Arc<Store<usize, usize>> = Arc::new(Store::new(MAX_COUNT));
    let quarter = MAX_COUNT / 4;

    let handles: Vec<_> = (0..4)
        .map(|q| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for key in q * quarter..(q + 1) * quarter {
                    store.insert(key, VALUE_FACTOR * key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), MAX_COUNT);
    for key in 0..MAX_COUNT {
        match store.find(&key) {
            None => panic!("key is missing: {key}"),
            Some(value) => assert_eq!(value, VALUE_FACTOR * key, "invalid value for key {key}"),
        }
    }
    assert_eq!(store.find(&MAX_COUNT), None);
}

/// Disjoint writers overflowing the store leave exactly `max_size` entries,
/// each carrying the value written for it.
#[test]
fn stress_disjoint_writers_overflow() {
    const MAX_SIZE: usize = 1_000;
    let store: Arc<Store<usize, usize>> = Arc::new(Store::new(MAX_SIZE));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = t * OPS_PER_THREAD + i;
                    store.insert(key, key * 3);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), MAX_SIZE);
    let mut seen = 0;
    store.map(|k, v| {
        assert_eq!(*v, k * 3);
        seen += 1;
    });
    assert_eq!(seen, MAX_SIZE);

    let stats = store.stats();
    assert_eq!(stats.insertions as usize, NUM_THREADS * OPS_PER_THREAD);
    assert_eq!(stats.evictions as usize, NUM_THREADS * OPS_PER_THREAD - MAX_SIZE);
}

/// Many threads hammering a handful of keys.
#[test]
fn stress_high_contention() {
    let store: Arc<Store<usize, usize>> = Arc::new(Store::new(100));
    let hot_keys = 10;

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (i / 2) % hot_keys;
                    if i % 2 == 0 {
                        store.insert(key, t);
                    } else {
                        let _ = store.find(&key);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), hot_keys);
    store.map(|_, v| assert!(*v < NUM_THREADS));
}

/// Optimistic increments through `compare_exchange` never lose an update.
#[test]
fn stress_compare_exchange_counter() {
    const INCREMENTS: usize = 2_000;
    let store: Arc<Store<&'static str, usize>> = Arc::new(Store::new(4));
    let retries = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let retries = Arc::clone(&retries);
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    let mut expected = store.find("counter");
                    loop {
                        let desired = expected.unwrap_or(0) + 1;
                        if store.compare_exchange("counter", desired, &mut expected) {
                            break;
                        }
                        retries.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.find("counter"), Some(8 * INCREMENTS));
    let metrics = store.metrics();
    assert_eq!(metrics["cas_successes"], (8 * INCREMENTS) as f64);
    assert_eq!(metrics["cas_failures"], retries.load(Ordering::Relaxed) as f64);
}

/// Mixed readers, writers, erasers and snapshotters; the size bound holds
/// throughout.
#[test]
fn stress_mixed_operations_respect_bound() {
    const MAX_SIZE: usize = 64;
    let store: Arc<Store<usize, usize>> = Arc::new(Store::new(MAX_SIZE));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD / 4 {
                    let key = (t * 31 + i) % 256;
                    match i % 6 {
                        0 | 1 => {
                            store.insert(key, key);
                        }
                        2 => {
                            let _ = store.find(&key);
                        }
                        3 => {
                            let _ = store.erase(&key);
                        }
                        4 => {
                            let snapshot = store.dump();
                            assert!(snapshot.len() <= MAX_SIZE);
                            for (k, v) in snapshot {
                                assert_eq!(k, v);
                            }
                        }
                        5 => {
                            assert!(store.len() <= MAX_SIZE);
                        }
                        _ => unreachable!(),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(store.len() <= MAX_SIZE);
}

/// Writers race an advancing clock; expired entries are never reported.
#[test]
fn stress_expiry_with_concurrent_writers() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(Store::with_lifetime_and_clock(
        500,
        Duration::from_millis(10),
        Arc::clone(&clock),
    ));

    let handles: Vec<_> = (0..4usize)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD / 10 {
                    store.insert(t * 10_000 + i, i);
                    let _ = store.last();
                }
            })
        })
        .collect();

    for _ in 0..50 {
        clock.advance(Duration::from_millis(1));
        thread::yield_now();
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(store.len() <= 500);
    clock.advance(Duration::from_millis(10));
    assert!(store.is_empty());
    assert_eq!(store.dump(), Vec::new());
}
