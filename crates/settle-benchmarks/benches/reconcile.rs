//! Reconciliation performance benchmarks
//!
//! Benchmarks flattening, path-tree rebuilding and pairwise reconciliation
//! across settings documents of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::Value;
use settle_benchmarks::{criterion_config, settings_document};
use settle_config::{flatten, reconcile, PathTreeBuilder};

const SIZES: [usize; 4] = [10, 50, 100, 500];

/// Benchmark flattening documents into `Section:Key` pairs
fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for sections in SIZES.iter() {
        let document = settings_document(*sections, 10, 0);
        group.throughput(Throughput::Elements((*sections * 10) as u64));

        group.bench_with_input(BenchmarkId::new("sections", sections), &document, |b, document| {
            b.iter(|| black_box(flatten(document).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark rebuilding a nested document from flattened keys
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_tree_build");

    for sections in SIZES.iter() {
        let flat = flatten(&settings_document(*sections, 10, 0)).unwrap();
        group.throughput(Throughput::Elements(flat.len() as u64));

        group.bench_with_input(BenchmarkId::new("keys", flat.len()), &flat, |b, flat| {
            b.iter(|| {
                let mut builder = PathTreeBuilder::empty();
                for (key, value) in flat {
                    builder.set(key, value.clone());
                }
                black_box(builder.into_document())
            });
        });
    }

    group.finish();
}

/// Benchmark reconciling two partially overlapping documents
fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.measurement_time(std::time::Duration::from_secs(5));

    for sections in SIZES.iter() {
        let base = settings_document(*sections, 10, 0);
        let upper = settings_document(*sections + sections / 2, 10, 1);
        let pair: (Value, Value) = (base, upper);

        group.bench_with_input(BenchmarkId::new("sections", sections), &pair, |b, (base, upper)| {
            b.iter(|| black_box(reconcile(base, upper).unwrap()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_flatten, bench_build, bench_reconcile
}
criterion_main!(benches);
