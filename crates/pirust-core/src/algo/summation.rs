//! Thread-level partial summation of one rank's block.
//!
//! Each worker of a dedicated rayon pool walks its share of the block with
//! a private recurrence state and a private partial sum, then folds that sum
//! into the rank total exactly once under a mutex.

use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::Series;
use crate::partition::{thread_share, ThreadSplit};
use crate::{BigFloat, PiError, PiResult, Precision};

/// Walks `range` with the given `stride`, accumulating into a private sum.
///
/// The state is initialized once at `range.start` and then advanced in
/// O(1) per term; it is never advanced past the last owned term.
fn run_worker<S: Series>(
    series: &S,
    range: Range<u64>,
    stride: u64,
    precision: Precision,
) -> PiResult<BigFloat> {
    let mut sum = BigFloat::zero(precision);
    if range.is_empty() {
        return Ok(sum);
    }

    let terms = (range.end - range.start).div_ceil(stride);
    let mut state = series.state_at(range.start, stride, precision)?;
    for i in 0..terms {
        series.accumulate(&state, &mut sum)?;
        if i + 1 < terms {
            series.advance(&mut state)?;
        }
    }
    Ok(sum)
}

/// Sums `block` on a single thread, one term at a time.
///
/// This is the reference against which the threaded paths are checked.
pub fn sum_sequential<S: Series>(
    series: &S,
    block: Range<u64>,
    precision: Precision,
) -> PiResult<BigFloat> {
    run_worker(series, block, 1, precision)
}

/// Sums the terms of `block` with a pool of exactly `threads` workers.
///
/// Each worker owns its recurrence state and partial sum for its whole
/// lifetime and touches the shared process total exactly once, under a
/// mutex, after its share is exhausted. Workers whose share is empty do not
/// initialize any state.
///
/// # Errors
/// * `PiError::ThreadPool` if the pool cannot be built.
/// * The first arithmetic error raised by any worker.
///
/// # Example
/// ```
/// use pirust_core::algo::{sum_block, sum_sequential, Chudnovsky};
/// use pirust_core::partition::ThreadSplit;
/// use pirust_core::Precision;
///
/// let p = Precision::for_digits(50);
/// let threaded = sum_block(&Chudnovsky, 0..8, 3, ThreadSplit::Cyclic, p).unwrap();
/// let sequential = sum_sequential(&Chudnovsky, 0..8, p).unwrap();
/// assert!(threaded.approx_eq(&sequential, 16));
/// ```
pub fn sum_block<S: Series>(
    series: &S,
    block: Range<u64>,
    threads: usize,
    split: ThreadSplit,
    precision: Precision,
) -> PiResult<BigFloat> {
    let threads = threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("pi-worker-{i}"))
        .build()
        .map_err(|e| PiError::ThreadPool(e.to_string()))?;

    let total: Mutex<PiResult<BigFloat>> = Mutex::new(Ok(BigFloat::zero(precision)));

    pool.scope(|s| {
        for thread in 0..threads {
            let Some((range, stride)) = thread_share(&block, thread, threads, split) else {
                debug!(thread, "no terms assigned");
                continue;
            };
            let total = &total;
            s.spawn(move |_| {
                debug!(thread, start = range.start, end = range.end, stride, "worker started");
                let partial = run_worker(series, range, stride, precision);

                let mut guard = total.lock().unwrap_or_else(PoisonError::into_inner);
                match partial {
                    Ok(partial) => {
                        if let Ok(acc) = guard.as_mut() {
                            *acc += &partial;
                        }
                    }
                    Err(err) => {
                        if guard.is_ok() {
                            *guard = Err(err);
                        }
                    }
                }
                debug!(thread, "worker folded");
            });
        }
    });

    total.into_inner().unwrap_or_else(PoisonError::into_inner)
}
