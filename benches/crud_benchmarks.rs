use belt_tree::{BPlusTree, TreeConfig};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;
use std::hint::black_box;

const N: usize = 10_000;

/// Minimum degrees compared in every group.
const DEGREES: [usize; 3] = [2, 8, 32];

// ─── Key sequences ──────────────────────────────────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Deterministic LCG so runs stay comparable; duplicates are dropped.
    let mut keys = Vec::with_capacity(n);
    let mut seen = std::collections::BTreeSet::new();
    let mut x: u64 = 12345;
    while keys.len() < n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        let k = (x >> 33) as i64;
        if seen.insert(k) {
            keys.push(k);
        }
    }
    keys
}

fn build(min_degree: usize, keys: &[i64]) -> BPlusTree<i64, i64> {
    let mut tree = BPlusTree::with_config(TreeConfig::new(min_degree)).unwrap();
    for &k in keys {
        tree.insert(k, k).unwrap();
    }
    tree
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for (order, keys) in [("ordered", ordered_keys(N)), ("random", random_keys(N))] {
        for t in DEGREES {
            group.bench_function(BenchmarkId::new(format!("BPlusTree/t={t}"), order), |b| {
                b.iter(|| build(t, &keys));
            });
        }

        group.bench_function(BenchmarkId::new("BTreeMap", order), |b| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
                map
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let keys = random_keys(N);

    for t in DEGREES {
        let tree = build(t, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", t), |b| {
            b.iter(|| {
                for k in &keys {
                    black_box(tree.get(k));
                }
            });
        });
    }

    let map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            for k in &keys {
                black_box(map.get(k));
            }
        });
    });

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");
    let keys = random_keys(N);

    for t in DEGREES {
        let tree = build(t, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", t), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    for k in &keys {
                        tree.delete(k).unwrap();
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });
    }

    let map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || map.clone(),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("range");
    let keys = ordered_keys(N);

    for t in DEGREES {
        let tree = build(t, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree/range", t), |b| {
            b.iter(|| black_box(tree.range(&2_000, &2_999)));
        });
        group.bench_function(BenchmarkId::new("BPlusTree/scan_from", t), |b| {
            b.iter(|| black_box(tree.scan_from(&2_000, 1_000)));
        });
    }

    let map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    group.bench_function(BenchmarkId::new("BTreeMap/range", N), |b| {
        b.iter(|| black_box(map.range(2_000..=2_999).map(|(k, _)| *k).collect::<Vec<_>>()));
    });

    group.finish();
}

// ─── Criterion Groups ───────────────────────────────────────────────────────

criterion_group!(crud_benches, bench_insert, bench_get, bench_delete);

criterion_group!(range_benches, bench_range);

criterion_main!(crud_benches, range_benches);
