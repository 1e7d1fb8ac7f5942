//! Benchmark fixtures for Quiver containers.
//!
//! Provides deterministic inputs for the criterion benches:
//!
//! - [`random_keys`]: a seeded stream of `u64` keys
//! - [`filled_map`]: a map preloaded with those keys
//! - [`shuffled_array`]: an array of the integers `0..n` in seeded order

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use quiver_array::Array;
use quiver_map::HashMap;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `n` pseudo-random keys from a ChaCha8 stream seeded with `seed`.
pub fn random_keys(seed: u64, n: usize) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.next_u64()).collect()
}

/// A map from each key to its position in `keys`.
pub fn filled_map(keys: &[u64]) -> HashMap<u64, u64> {
    let mut map = HashMap::with_capacity(keys.len());
    for (i, &key) in keys.iter().enumerate() {
        map.insert(key, i as u64);
    }
    map
}

/// The integers `0..n`, shuffled by a Fisher-Yates pass over a seeded
/// stream.
pub fn shuffled_array(seed: u64, n: usize) -> Array<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut values: Vec<i64> = (0..n as i64).collect();
    for i in (1..values.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
    Array::from_vec(values)
}
