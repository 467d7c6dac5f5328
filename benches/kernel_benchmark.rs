//! Kernel, cache and solver benchmarks.
//!
//! Row evaluation with sequential and rayon backends, cache hit paths, and
//! one binary solve over a synthetic sparse problem.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mcsvm::backend::{Parallelism, RowBackend};
use mcsvm::cache::KernelCache;
use mcsvm::kernel::{Kernel, KernelKind};
use mcsvm::solver::SMOSolver;
use mcsvm::{SolverConfig, SparseVector};

/// Sparse vectors with roughly `density * dim` non-zeros, deterministic
fn generate_points(n: usize, dim: usize, density: f64, seed: u64) -> Vec<SparseVector> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..n)
        .map(|_| {
            let mut indices = Vec::new();
            let mut values = Vec::new();
            for d in 0..dim {
                if next() < density {
                    indices.push(d);
                    values.push(2.0 * next() - 1.0);
                }
            }
            SparseVector::new(indices, values)
        })
        .collect()
}

fn bench_kernel_compute(c: &mut Criterion) {
    let points = generate_points(2, 1000, 0.1, 1);
    let kernels = [
        KernelKind::linear(),
        KernelKind::rbf(0.1),
        KernelKind::polynomial(3, 0.1, 1.0),
        KernelKind::sigmoid(0.01, 0.0),
    ];

    let mut group = c.benchmark_group("kernel/compute");
    for kernel in kernels {
        group.bench_function(kernel.name(), |b| {
            b.iter(|| black_box(kernel.compute(black_box(&points[0]), black_box(&points[1]))));
        });
    }
    group.finish();
}

fn bench_kernel_row(c: &mut Criterion) {
    let kernel = KernelKind::rbf(0.1);
    let mut group = c.benchmark_group("kernel/row");

    for &n in &[1_000, 10_000] {
        let points = generate_points(n, 200, 0.1, 2);
        let mut out = vec![0.0; n];
        group.throughput(Throughput::Elements(n as u64));

        for backend in [Parallelism::Sequential, Parallelism::Parallel] {
            let name = if backend.is_parallel() { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(name, n), &points, |b, points| {
                b.iter(|| {
                    backend.kernel_row(&kernel, &points[0], points, &mut out);
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let kernel = KernelKind::rbf(0.1);
    let backend = Parallelism::Sequential;
    let points = generate_points(2_000, 200, 0.1, 3);
    let row_bytes = points.len() * 8;

    let mut group = c.benchmark_group("cache");

    // Working set fits: every query after warm-up is a hit
    group.bench_function("row_hit", |b| {
        let mut cache = KernelCache::new(&kernel, &points, &backend, 64 * row_bytes);
        for i in 0..32 {
            cache.query_row(i);
        }
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 32;
            black_box(cache.query_row(i));
        });
    });

    // Capacity of two rows cycling over three: every query misses
    group.bench_function("row_miss", |b| {
        let mut cache = KernelCache::new(&kernel, &points, &backend, 2 * row_bytes);
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % 3;
            black_box(cache.query_row(i));
        });
    });

    group.finish();
}

fn bench_solver(c: &mut Criterion) {
    let points = generate_points(500, 50, 0.3, 4);
    let y: Vec<f64> = points
        .iter()
        .map(|p| if p.get(0) + p.get(1) >= 0.0 { 1.0 } else { -1.0 })
        .collect();

    let mut group = c.benchmark_group("solver");
    group.sample_size(10);
    for shrinking in [false, true] {
        let config = SolverConfig {
            shrinking,
            ..SolverConfig::default()
        };
        let solver = SMOSolver::new(KernelKind::rbf(0.5), Parallelism::Sequential, config);
        let name = if shrinking { "shrinking" } else { "plain" };
        group.bench_function(name, |b| {
            b.iter(|| black_box(solver.solve(&points, &y)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_kernel_compute,
    bench_kernel_row,
    bench_cache,
    bench_solver
);
criterion_main!(benches);
