//! Benchmarks for HNSW index operations.
//!
//! Run with: cargo bench --bench hnsw_bench

use annindex::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const DIM: usize = 128;

/// Generate random vectors for benchmarking.
fn generate_vectors(count: usize, dim: usize) -> Vec<Vec<f32>> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

fn build_index(vectors: &[Vec<f32>], m: usize, ef_construction: usize) -> HnswIndex<f32> {
    let params = HnswParams::new(DIM, Metric::L2)
        .with_max_elements(vectors.len())
        .with_m(m)
        .with_ef_construction(ef_construction);
    let mut index = HnswIndex::new(create_distance_function(Metric::L2, DIM), params).unwrap();
    for (i, v) in vectors.iter().enumerate() {
        index.add_vector(black_box(v), i as u64, false).unwrap();
    }
    index
}

/// Benchmark inserting vectors.
fn bench_hnsw_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_add");
    group.sample_size(10);

    for size in [100, 500, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let vectors = generate_vectors(size, DIM);
            b.iter(|| build_index(&vectors, 16, 100));
        });
    }

    group.finish();
}

/// Benchmark inserting vectors with varying M parameter.
fn bench_hnsw_add_varying_m(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_add_m");
    group.sample_size(10);

    let size = 500;
    let vectors = generate_vectors(size, DIM);

    for m in [4, 8, 16, 32] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |b, &m| {
            b.iter(|| build_index(&vectors, m, 100));
        });
    }

    group.finish();
}

/// Benchmark k-NN queries with varying ef_runtime.
fn bench_hnsw_query_varying_ef(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_query_ef");

    let vectors = generate_vectors(5000, DIM);
    let mut index = build_index(&vectors, 16, 200);
    let queries = generate_vectors(100, DIM);

    for ef in [10, 50, 100, 200] {
        index.set_ef_runtime(ef);
        group.bench_with_input(BenchmarkId::from_parameter(ef), &ef, |b, _| {
            let mut i = 0;
            b.iter(|| {
                let query = &queries[i % queries.len()];
                i += 1;
                index.search_knn(black_box(query), 10, None).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark filtered k-NN queries that reject half the labels.
fn bench_hnsw_query_filtered(c: &mut Criterion) {
    let vectors = generate_vectors(5000, DIM);
    let index = build_index(&vectors, 16, 200);
    let query = generate_vectors(1, DIM).remove(0);
    let even = |label: LabelType| label % 2 == 0;

    c.bench_function("hnsw_query_filtered", |b| {
        b.iter(|| index.search_knn(black_box(&query), 10, Some(&even)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_hnsw_add,
    bench_hnsw_add_varying_m,
    bench_hnsw_query_varying_ef,
    bench_hnsw_query_filtered,
);
criterion_main!(benches);
