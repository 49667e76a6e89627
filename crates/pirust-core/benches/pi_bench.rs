//! Criterion benchmarks for the PiRust series engines.
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/report/index.html`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pirust_core::algo::{sum_block, sum_sequential, Chudnovsky, Series};
use pirust_core::partition::ThreadSplit;
use pirust_core::{compute_pi, Algorithm, PiConfig, Precision};

/// Builds every term from scratch, as a worker would without a recurrence.
fn chudnovsky_direct_terms(terms: u64, precision: Precision) {
    for index in 0..terms {
        let state = Chudnovsky.state_at(index, 1, precision).unwrap();
        black_box(state.term().unwrap());
    }
}

/// Direct initialization of every term vs one init plus O(1) advances.
fn direct_vs_recurrence(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct_vs_recurrence");
    group.sample_size(10);

    for digits in [1_000u64, 5_000, 10_000] {
        let precision = Precision::for_digits(digits);
        let terms = Algorithm::Chudnovsky.iterations_for(digits);
        group.throughput(Throughput::Elements(terms));

        group.bench_with_input(BenchmarkId::new("direct", digits), &terms, |b, &terms| {
            b.iter(|| chudnovsky_direct_terms(black_box(terms), precision))
        });

        group.bench_with_input(BenchmarkId::new("recurrence", digits), &terms, |b, &terms| {
            b.iter(|| sum_sequential(&Chudnovsky, 0..black_box(terms), precision).unwrap())
        });
    }

    group.finish();
}

/// End-to-end comparison of the series at the same digit count.
fn algorithm_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithm_comparison");
    group.sample_size(10);

    for digits in [500u64, 2_000] {
        for algorithm in Algorithm::ALL {
            let config = PiConfig::new(digits, 1, 2, algorithm);
            let id = BenchmarkId::new(algorithm.name(), digits);
            group.bench_with_input(id, &config, |b, config| {
                b.iter(|| compute_pi(black_box(config)).unwrap())
            });
        }
    }

    group.finish();
}

/// Thread scaling of one rank's block.
fn thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    let digits = 20_000u64;
    let precision = Precision::for_digits(digits);
    let terms = Algorithm::Chudnovsky.iterations_for(digits);
    group.sample_size(10);
    group.throughput(Throughput::Elements(terms));

    for threads in [1usize, 2, 4, 8] {
        for split in [ThreadSplit::Cyclic, ThreadSplit::Blocks] {
            let id = BenchmarkId::new(format!("{split:?}").to_lowercase(), threads);
            group.bench_with_input(id, &threads, |b, &threads| {
                b.iter(|| {
                    sum_block(&Chudnovsky, 0..terms, black_box(threads), split, precision).unwrap()
                })
            });
        }
    }

    group.finish();
}

/// Rank scaling with a fixed total worker count.
fn rank_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_scaling");
    group.sample_size(10);

    for (procs, threads) in [(1usize, 4usize), (2, 2), (4, 1)] {
        let config = PiConfig::new(10_000, procs, threads, Algorithm::Chudnovsky);
        let id = format!("{procs}x{threads}");
        group.bench_function(&id, |b| b.iter(|| compute_pi(black_box(&config)).unwrap()));
    }

    group.finish();
}

criterion_group!(
    benches,
    direct_vs_recurrence,
    algorithm_comparison,
    thread_scaling,
    rank_scaling,
);
criterion_main!(benches);
