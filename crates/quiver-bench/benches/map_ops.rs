//! Criterion micro-benchmarks for map insertion, lookup and churn.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use quiver_bench::{filled_map, random_keys};
use quiver_map::HashMap;

const N: usize = 10_000;

fn bench_insert(c: &mut Criterion) {
    let keys = random_keys(11, N);

    c.bench_function("map_insert_10k_growing", |b| {
        b.iter(|| {
            let mut map = HashMap::new();
            for &key in &keys {
                map.insert(key, key);
            }
            black_box(map.len())
        });
    });

    c.bench_function("map_insert_10k_reserved", |b| {
        b.iter(|| {
            let mut map = HashMap::with_capacity(N);
            for &key in &keys {
                map.insert(key, key);
            }
            black_box(map.len())
        });
    });
}

fn bench_lookup(c: &mut Criterion) {
    let keys = random_keys(12, N);
    let misses = random_keys(13, N);
    let map = filled_map(&keys);

    c.bench_function("map_get_hit_10k", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.get(key));
            }
        });
    });

    c.bench_function("map_get_miss_10k", |b| {
        b.iter(|| {
            for key in &misses {
                black_box(map.get(key));
            }
        });
    });
}

fn bench_churn(c: &mut Criterion) {
    let keys = random_keys(14, N);

    c.bench_function("map_remove_reinsert_10k", |b| {
        b.iter_batched(
            || filled_map(&keys),
            |mut map| {
                for &key in &keys {
                    let value = map.remove(&key);
                    if let Some(value) = value {
                        map.insert(key, value);
                    }
                }
                map
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_insert, bench_lookup, bench_churn);
criterion_main!(benches);
