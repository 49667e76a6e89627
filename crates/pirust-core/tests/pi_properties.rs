//! Property-based tests for the series engines and the hybrid pipeline.
//!
//! These tests check that every way of splitting the term range (ranks,
//! threads, cyclic or blocks) reproduces the sequential sum, that direct
//! initialization agrees with stepping, and that end-to-end runs recover
//! the reference digits.

use std::io::Cursor;

use pirust_core::algo::{sum_block, sum_sequential, Bbp, Bellard, Chudnovsky, Series};
use pirust_core::codec;
use pirust_core::comm::{Communicator, LocalGroup, PipeRoot, PipeWorker};
use pirust_core::partition::{BlockPartition, ThreadSplit};
use pirust_core::reference::{self, PI_100};
use pirust_core::{compute_pi, run_rank, Algorithm, BigFloat, PiConfig, PiError, Precision};
use proptest::prelude::*;

/// Slack for sums whose terms were added in a different order.
const SLACK_BITS: u64 = 32;

/// Sums `0..iterations` the way a group of `procs` ranks would, folding the
/// rank totals in rank order.
fn partitioned_sum<S: Series>(
    series: &S,
    iterations: u64,
    procs: usize,
    threads: usize,
    split: ThreadSplit,
    precision: Precision,
) -> BigFloat {
    let mut total = BigFloat::zero(precision);
    for block in BlockPartition::new(iterations, procs).blocks() {
        total += &sum_block(series, block, threads, split, precision).unwrap();
    }
    total
}

// ============================================================================
// Property: direct initialization agrees with stepping one term at a time
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn chudnovsky_direct_init_matches_stepping(index in 0u64..40) {
        let p = Precision::for_digits(600);
        let direct = Chudnovsky.state_at(index, 1, p).unwrap();

        let mut stepped = Chudnovsky.state_at(0, 1, p).unwrap();
        for _ in 0..index {
            Chudnovsky.advance(&mut stepped).unwrap();
        }

        prop_assert_eq!(stepped.index(), index);
        prop_assert!(direct.ratio().approx_eq(stepped.ratio(), SLACK_BITS));
        prop_assert!(direct.power_term().approx_eq(stepped.power_term(), SLACK_BITS));
        prop_assert_eq!(direct.linear_term(), stepped.linear_term());
    }

    #[test]
    fn chudnovsky_strided_advance_matches_direct_init(index in 0u64..30, stride in 1u64..8) {
        let p = Precision::for_digits(600);
        let mut state = Chudnovsky.state_at(index, stride, p).unwrap();
        Chudnovsky.advance(&mut state).unwrap();
        let direct = Chudnovsky.state_at(index + stride, stride, p).unwrap();

        prop_assert_eq!(state.index(), index + stride);
        prop_assert!(direct.ratio().approx_eq(state.ratio(), SLACK_BITS));
        prop_assert!(direct.power_term().approx_eq(state.power_term(), SLACK_BITS));
        prop_assert_eq!(direct.linear_term(), state.linear_term());
    }
}

// ============================================================================
// Property: any procs x threads split reproduces the sequential sum
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn chudnovsky_partition_invariance(
        iterations in 1u64..24,
        procs in 1usize..5,
        threads in 1usize..5,
        blocks in any::<bool>(),
    ) {
        let p = Precision::for_digits(iterations * 14);
        let split = if blocks { ThreadSplit::Blocks } else { ThreadSplit::Cyclic };
        let sequential = sum_sequential(&Chudnovsky, 0..iterations, p).unwrap();
        let hybrid = partitioned_sum(&Chudnovsky, iterations, procs, threads, split, p);
        prop_assert!(
            hybrid.approx_eq(&sequential, SLACK_BITS),
            "iterations={} procs={} threads={} split={:?}", iterations, procs, threads, split
        );
    }

    #[test]
    fn bbp_partition_invariance(
        iterations in 1u64..60,
        procs in 1usize..4,
        threads in 1usize..4,
    ) {
        let p = Precision::for_digits(80);
        let sequential = sum_sequential(&Bbp, 0..iterations, p).unwrap();
        let hybrid = partitioned_sum(&Bbp, iterations, procs, threads, ThreadSplit::Cyclic, p);
        prop_assert!(hybrid.approx_eq(&sequential, SLACK_BITS));
    }

    #[test]
    fn bellard_partition_invariance(
        iterations in 1u64..30,
        procs in 1usize..4,
        threads in 1usize..4,
    ) {
        let p = Precision::for_digits(100);
        let sequential = sum_sequential(&Bellard, 0..iterations, p).unwrap();
        let hybrid = partitioned_sum(&Bellard, iterations, procs, threads, ThreadSplit::Cyclic, p);
        prop_assert!(hybrid.approx_eq(&sequential, SLACK_BITS));
    }
}

// ============================================================================
// Property: more digits never lose correct decimals
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn decimals_grow_with_requested_digits(digits in 14u64..150) {
        let small = compute_pi(&PiConfig::new(digits, 1, 1, Algorithm::Chudnovsky)).unwrap();
        let large = compute_pi(&PiConfig::new(digits + 28, 1, 1, Algorithm::Chudnovsky)).unwrap();
        prop_assert!(small.decimals_computed >= digits.saturating_sub(2));
        prop_assert!(large.decimals_computed >= small.decimals_computed);
    }
}

// ============================================================================
// Exactness and edge cases
// ============================================================================

#[test]
fn single_worker_matches_sequential_bit_for_bit() {
    let p = Precision::for_digits(140);
    let sequential = sum_sequential(&Chudnovsky, 0..10, p).unwrap();
    let single = sum_block(&Chudnovsky, 0..10, 1, ThreadSplit::Cyclic, p).unwrap();
    assert_eq!(single.to_parts(), sequential.to_parts());
}

#[test]
fn empty_block_contributes_exact_zero() {
    let p = Precision::for_digits(50);
    let sum = sum_block(&Chudnovsky, 7..7, 4, ThreadSplit::Cyclic, p).unwrap();
    assert!(sum.is_zero());
    let payload = codec::encode(&sum, p).unwrap();
    assert!(codec::decode(&payload, p).unwrap().is_zero());
}

#[test]
fn one_digit_run() {
    let report = compute_pi(&PiConfig::new(1, 1, 1, Algorithm::Chudnovsky)).unwrap();
    assert_eq!(report.iterations, 1);
    assert_eq!(report.pi_string(), "3.1");
}

#[test]
fn hundred_digits_two_ranks_two_threads() {
    let report = compute_pi(&PiConfig::new(100, 2, 2, Algorithm::Chudnovsky)).unwrap();
    assert_eq!(report.pi_string(), PI_100);
    assert_eq!(report.decimals_computed, 100);
}

#[test]
fn blocks_and_cyclic_agree_end_to_end() {
    let cyclic = compute_pi(&PiConfig::new(200, 3, 2, Algorithm::Chudnovsky)).unwrap();
    let blocks = compute_pi(&PiConfig::new(200, 3, 2, Algorithm::ChudnovskyBlocks)).unwrap();
    assert_eq!(cyclic.pi_string(), blocks.pi_string());
    assert!(cyclic.decimals_computed >= 199);
}

#[test]
fn bbp_end_to_end() {
    let report = compute_pi(&PiConfig::new(100, 2, 3, Algorithm::Bbp)).unwrap();
    assert_eq!(report.iterations, 84);
    assert!(report.decimals_computed >= 98, "got {}", report.decimals_computed);
}

#[test]
fn bellard_end_to_end() {
    let report = compute_pi(&PiConfig::new(100, 3, 2, Algorithm::Bellard)).unwrap();
    assert_eq!(report.iterations, 33);
    assert!(report.decimals_computed >= 98, "got {}", report.decimals_computed);
}

#[test]
fn more_workers_than_terms_is_rejected() {
    let err = compute_pi(&PiConfig::new(28, 2, 2, Algorithm::Chudnovsky)).unwrap_err();
    assert_eq!(
        err,
        PiError::InsufficientIterations { iterations: 2, threads: 2, procs: 2 }
    );
}

#[test]
fn local_group_runs_every_rank() {
    let config = PiConfig::new(60, 3, 1, Algorithm::Chudnovsky);
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = LocalGroup::create(config.procs)
            .into_iter()
            .map(|mut comm| s.spawn(move || run_rank(&config, &mut comm)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });
    assert!(results[0].is_some());
    assert!(results[1..].iter().all(Option::is_none));
    assert_eq!(reference::count_correct_decimals(results[0].as_ref().unwrap(), 60), 60);
}

#[test]
fn pipe_transport_matches_in_process_run() {
    let config = PiConfig::new(100, 3, 2, Algorithm::Chudnovsky);
    let precision = config.precision();

    let frames: Vec<Vec<u8>> = (1..config.procs)
        .map(|rank| {
            let mut worker = PipeWorker::new(rank, config.procs, Vec::new());
            assert!(run_rank(&config, &mut worker).unwrap().is_none());
            worker.into_inner()
        })
        .collect();

    let mut root = PipeRoot::new(
        frames.into_iter().map(Cursor::new).collect(),
        codec::max_payload_len(precision),
    );
    assert_eq!(root.size(), config.procs);
    let pi = run_rank(&config, &mut root).unwrap().unwrap();

    let in_process = compute_pi(&config).unwrap();
    assert_eq!(pi.to_decimal_string(100), in_process.pi_string());
    assert_eq!(pi.to_decimal_string(100), PI_100);
}
