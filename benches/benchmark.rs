use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use avl_bimap::AvlBiMap;

const N: i32 = 100_000;

pub fn benchmarks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut keys: Vec<i32> = (0..N).collect();
    keys.shuffle(&mut rng);
    let mut values = keys.clone();
    values.shuffle(&mut rng);
    let pairs: Vec<(i32, i32)> = keys.iter().copied().zip(values.iter().copied()).collect();

    c.bench_function("bimap_insert_pair", |b| {
        b.iter(|| {
            let mut map = AvlBiMap::new();
            for (key, value) in &pairs {
                let _ = map.insert_pair(*key, *value);
            }
            map
        })
    });

    let map = AvlBiMap::try_from_pairs(pairs.iter().copied()).unwrap_or_default();

    c.bench_function("bimap_find_by_key", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.find_by_key(key));
            }
        })
    });

    c.bench_function("bimap_find_by_value", |b| {
        b.iter(|| {
            for value in &values {
                black_box(map.find_by_value(value));
            }
        })
    });

    c.bench_function("bimap_iter", |b| {
        b.iter(|| {
            for (k, v) in &map {
                black_box((k, v));
            }
        })
    });

    c.bench_function("bimap_delete_by_key", |b| {
        b.iter(|| {
            let mut map = map.clone();
            for key in &keys {
                let _ = map.delete_by_key(key);
            }
            map
        })
    });
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
