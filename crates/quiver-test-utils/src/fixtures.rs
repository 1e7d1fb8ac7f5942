//! Prebuilt containers for integration tests and benchmarks.
//!
//! - [`int_array`]: an [`Array`] of the given integers, in order.
//! - [`string_map`]: a [`HashMap`] from owned strings to integers.

use quiver_array::Array;
use quiver_map::HashMap;

pub fn int_array(values: &[i64]) -> Array<i64> {
    values.iter().copied().collect()
}

pub fn string_map(entries: &[(&str, i32)]) -> HashMap<String, i32> {
    entries
        .iter()
        .map(|&(key, value)| (key.to_owned(), value))
        .collect()
}
