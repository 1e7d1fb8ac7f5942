//! Integration test: map behaviour through the public API.
//!
//! Covers the string-keyed removal scenario, tombstones inside a single
//! collision chain, round-trips across several resizes, the Robin-Hood
//! probe-distance distribution on random keys, ownership transfer and deep
//! copies, and maps holding arrays.

use quiver_array::Array;
use quiver_map::{HashMap, MapConfig, SlotState};
use quiver_test_utils::{int_array, string_map, Colliding, Name};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn remove_one_of_three_string_keys() {
    let mut map = string_map(&[("one", 1), ("two", 2), ("three", 3)]);
    assert_eq!(map.remove(&"two".to_owned()), Some(2));
    assert!(!map.contains_key(&"two".to_owned()));
    assert_eq!(map.get(&"one".to_owned()), Some(&1));
    assert_eq!(map.get(&"three".to_owned()), Some(&3));
    assert_eq!(map.len(), 2);
}

#[test]
fn tombstone_in_a_collision_chain_does_not_block_lookups() {
    let (a, b, c) = (Colliding(1), Colliding(2), Colliding(3));
    let mut map = HashMap::new();
    map.insert(a, "a");
    map.insert(b, "b");
    map.insert(c, "c");
    assert_eq!(map.probe_stats().max, 2);

    assert_eq!(map.remove(&b), Some("b"));
    assert_eq!(map.as_raw().tombstones(), 1);
    assert_eq!(map.get(&a), Some(&"a"));
    assert_eq!(map.get(&c), Some(&"c"));
    assert_eq!(map.get(&b), None);
    assert!(!map.contains_key(&b));

    // The tombstone is reused by the next insertion along the chain.
    map.insert(Colliding(4), "d");
    assert_eq!(map.as_raw().tombstones(), 0);
    assert_eq!(map.get(&c), Some(&"c"));
}

#[test]
fn round_trip_across_resizes() {
    let mut map = HashMap::new();
    let mut capacities = vec![];
    for k in 0..500u64 {
        map.insert(k, k.wrapping_mul(0x9e37_79b9));
        assert_eq!(map.get(&k), Some(&k.wrapping_mul(0x9e37_79b9)));
        if capacities.last() != Some(&map.capacity()) {
            capacities.push(map.capacity());
        }
    }
    assert_eq!(capacities, vec![8, 16, 32, 64, 128, 256, 512]);
    for k in 0..500u64 {
        assert_eq!(map.get(&k), Some(&k.wrapping_mul(0x9e37_79b9)));
    }
}

#[test]
fn unrelated_inserts_do_not_disturb_existing_keys() {
    let mut map = string_map(&[("anchor", 42)]);
    for i in 0..100 {
        map.insert(format!("filler-{i}"), i);
        assert_eq!(map.get(&"anchor".to_owned()), Some(&42));
    }
}

// ── Capacity ────────────────────────────────────────────────────────

#[test]
fn first_insert_allocates_eight_slots() {
    let mut map: HashMap<u32, u32> = HashMap::new();
    assert_eq!(map.capacity(), 0);
    map.insert(1, 1);
    assert_eq!(map.capacity(), 8);
}

#[test]
fn configured_first_allocation() {
    let config = MapConfig::new(64).unwrap();
    let mut map: HashMap<u32, u32> = HashMap::with_config(config);
    map.insert(1, 1);
    assert_eq!(map.capacity(), 64);
}

#[test]
fn reserve_rounds_to_a_power_of_two() {
    let mut map: HashMap<u32, u32> = HashMap::with_capacity(100);
    assert_eq!(map.capacity(), 128);
    map.reserve(10);
    assert_eq!(map.capacity(), 128);
}

#[test]
fn shrink_to_fit_then_release() {
    let mut map: HashMap<u32, u32> = HashMap::with_capacity(1000);
    for k in 0..3 {
        map.insert(k, k);
    }
    map.shrink_to_fit();
    assert_eq!(map.capacity(), 4);
    for k in 0..3 {
        assert_eq!(map.get(&k), Some(&k));
    }
    map.clear();
    map.shrink_to_fit();
    assert_eq!(map.capacity(), 0);
    assert!(map.as_raw().slots().is_empty());
}

#[test]
fn clear_resets_tombstones() {
    let mut map: HashMap<u32, u32> = (0..6).map(|k| (k, k)).collect();
    map.remove(&0);
    map.clear();
    assert!(map.is_empty());
    assert!(map
        .as_raw()
        .slots()
        .iter()
        .all(|slot| slot.state() == SlotState::Empty));
}

// ── Robin-Hood distribution ─────────────────────────────────────────

#[test]
fn probe_distances_stay_small_at_half_load() {
    const N: usize = 4096;
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut map = HashMap::with_capacity(2 * N);
    assert!(map.capacity() >= 2 * N);
    for _ in 0..N {
        map.insert(rng.next_u64(), 0u8);
    }
    let stats = map.probe_stats();
    assert_eq!(stats.len, map.len());
    assert!(stats.mean < 1.5, "mean probe distance {}", stats.mean);
    let log_n = (usize::BITS - N.leading_zeros()) as usize;
    assert!(stats.max <= 2 * log_n, "max probe distance {}", stats.max);
}

// ── Ownership ───────────────────────────────────────────────────────

#[test]
fn take_leaves_an_unallocated_map() {
    let mut source = string_map(&[("x", 1), ("y", 2)]);
    let moved = source.take();
    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);
    assert_eq!(source.get(&"x".to_owned()), None);
    assert_eq!(moved.get(&"y".to_owned()), Some(&2));
}

#[test]
fn copies_are_independent() {
    let mut original = HashMap::new();
    original.insert(1u8, Name::from("first"));
    let mut copy = original.clone();
    if let Some(name) = copy.get_mut(&1) {
        name.0.push_str("-edited");
    }
    copy.insert(2, Name::from("second"));
    assert_eq!(original.len(), 1);
    assert_eq!(original.get(&1), Some(&Name::from("first")));
    assert_eq!(copy.get(&1), Some(&Name::from("first-edited")));
}

#[test]
fn maps_hold_arrays() {
    let mut map: HashMap<u32, Array<i64>> = HashMap::new();
    map.insert(1, int_array(&[1, 2, 3]));
    let mut copy = map.clone();
    if let Some(values) = copy.get_mut(&1) {
        values.push(4);
    }
    assert_eq!(map.get(&1).map(Array::len), Some(3));
    assert_eq!(copy.get(&1).map(Array::len), Some(4));
}
