//! Performance benchmarks for the snapshot history.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use redpen::{DeltaPolicy, SnapshotKind, SnapshotStore};
use tempfile::TempDir;

fn create_store(dir: &TempDir) -> SnapshotStore {
    SnapshotStore::open(dir.path().join("history.log"), 64).unwrap()
}

fn document(words: usize, seed: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", (i * 31 + seed) % 997))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Benchmark appends of documents of different sizes
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    group.sample_size(20);

    for words in [100, 1_000, 3_000] {
        group.bench_with_input(BenchmarkId::new("words", words), &words, |b, &words| {
            let dir = TempDir::new().unwrap();
            let store = create_store(&dir);
            let mut seed = 0;

            b.iter(|| {
                seed += 1;
                black_box(store.append(&document(words, seed), SnapshotKind::Auto));
            });
        });
    }

    group.finish();
}

/// Benchmark appends absorbed by dedup
fn bench_duplicate_append(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = create_store(&dir);
    let text = document(3_000, 7);
    store.append(&text, SnapshotKind::Manual);

    c.bench_function("duplicate_append", |b| {
        b.iter(|| black_box(store.append(&text, SnapshotKind::Auto)));
    });
}

/// Benchmark listing history of different lengths
fn bench_list_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_all");

    for count in [10, 100, 500] {
        let dir = TempDir::new().unwrap();
        let store = create_store(&dir);
        for i in 0..count {
            store.append(&document(300, i), SnapshotKind::Auto);
        }

        group.bench_with_input(BenchmarkId::new("snapshots", count), &count, |b, _| {
            b.iter(|| black_box(store.list_all()));
        });
    }

    group.finish();
}

/// Benchmark reopening a log, which rebuilds the index
fn bench_reopen(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    {
        let store = create_store(&dir);
        for i in 0..500 {
            store.append(&document(300, i), SnapshotKind::Auto);
        }
    }

    c.bench_function("reopen_500", |b| {
        b.iter(|| black_box(create_store(&dir).count()));
    });
}

fn bench_delta_check(c: &mut Criterion) {
    let policy = DeltaPolicy::default();
    let baseline = document(3_000, 1);
    let current = document(3_050, 1);

    c.bench_function("delta_check", |b| {
        b.iter(|| black_box(policy.exceeds_between(&baseline, &current)));
    });
}

criterion_group!(
    benches,
    bench_append,
    bench_duplicate_append,
    bench_list_all,
    bench_reopen,
    bench_delta_check
);
criterion_main!(benches);
