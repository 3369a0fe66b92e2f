use chain_hashmap::ChainedHashMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    // Starts at the default 10 buckets, so this includes every growth step.
    c.bench_function("chained_hash_map_insert_10k", |b| {
        b.iter_batched(
            ChainedHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_presized(c: &mut Criterion) {
    c.bench_function("chained_hash_map_insert_10k_presized", |b| {
        b.iter_batched(
            || ChainedHashMap::<String, u64>::with_capacity(16_384),
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained_hash_map_get_hit", |b| {
        let mut m = ChainedHashMap::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()).unwrap());
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chained_hash_map_get_miss", |b| {
        let mut m = ChainedHashMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()).is_err());
        })
    });
}

fn bench_remove_reinsert(c: &mut Criterion) {
    c.bench_function("chained_hash_map_remove_reinsert", |b| {
        let mut m = ChainedHashMap::new();
        let keys: Vec<_> = lcg(3).take(10_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let v = m.remove(k.as_str()).unwrap();
            black_box(m.insert(k.clone(), v));
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_insert_presized, bench_get_hit, bench_get_miss, bench_remove_reinsert
}
criterion_main!(benches);
