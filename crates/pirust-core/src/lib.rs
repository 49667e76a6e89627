//! # PiRust Core
//!
//! Hybrid parallel computation of Pi to arbitrary precision.
//!
//! The term range of a convergent series is split in two levels: contiguous
//! blocks across ranks (processes), and a cyclic or block split across the
//! threads of each rank. Every worker initializes its recurrence state
//! directly at its first term and then advances it in O(1) big-number
//! operations per term. Partial sums are folded per rank under a mutex,
//! serialized, and combined across ranks with a reduce-to-root collective;
//! the root applies the series' closing formula.
//!
//! ## Series
//!
//! - **Chudnovsky**: ~14 digits per term. The default.
//! - **BBP**: ~1.2 digits per term.
//! - **Bellard**: ~3 digits per term.
//!
//! ## Features
//!
//! - `gmp`: use GMP/MPFR (via `rug`) instead of pure-Rust `ibig` for
//!   [`BigFloat`].
//! - `mpi`: adds `comm::MpiComm`, which runs the ranks under `mpirun`.
//!
//! ## Usage
//!
//! ```rust
//! use pirust_core::{compute_pi, Algorithm, PiConfig};
//!
//! let config = PiConfig::new(100, 2, 2, Algorithm::Chudnovsky);
//! let report = compute_pi(&config).unwrap();
//! assert!(report.pi_string().starts_with("3.14159265358979323846"));
//! assert_eq!(report.decimals_computed, 100);
//! ```

pub mod algo;
pub mod codec;
pub mod comm;
pub mod config;
pub mod float;
pub mod partition;
pub mod reference;
pub mod types;

pub use float::BigFloat;
pub use types::{Algorithm, PiConfig, PiError, PiResult, Precision};

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use comm::{Communicator, LocalGroup};
use partition::BlockPartition;

/// Runs one rank of a computation.
///
/// The rank takes its block of the term range, sums it with
/// `config.threads` workers, and joins the reduce-to-root collective. Only
/// the root assembles and returns the Pi approximation; every other rank
/// returns `None`. Ranks with an empty block still take part in the
/// collective with a zero contribution.
///
/// `config` must already be validated; the group size is taken from `comm`.
pub fn run_rank<C: Communicator>(config: &PiConfig, comm: &mut C) -> PiResult<Option<BigFloat>> {
    let rank = comm.rank();
    let precision = config.precision();
    let partition = BlockPartition::new(config.iterations(), comm.size());
    let block = partition.block(rank);

    debug!(rank, start = block.start, end = block.end, "block assigned");
    if block.is_empty() {
        warn!(rank, "empty block, contributing zero to the reduction");
    }

    let local = algo::evaluate_block(config.algorithm, block, config.threads, precision)?;
    debug!(rank, "threads joined, local total ready");

    let payload = codec::encode(&local, precision)?;
    drop(local);

    let Some(reduced) = comm.reduce_to_root(payload, codec::combine(precision))? else {
        debug!(rank, "contribution delivered to root");
        return Ok(None);
    };

    let sum = codec::decode(&reduced, precision)?;
    debug!(rank, "assembling");
    algo::assemble(config.algorithm, &sum).map(Some)
}

/// Outcome of a complete run, as seen by the root.
#[derive(Debug, Clone)]
pub struct PiReport {
    pub config: PiConfig,
    pub iterations: u64,
    pub pi: BigFloat,
    /// Leading decimals that match the reference value.
    pub decimals_computed: u64,
    /// Wall time of the computation, excluding the reference check.
    pub elapsed: Duration,
}

impl PiReport {
    /// Builds the report for a finished run and checks its digits.
    pub fn new(config: PiConfig, pi: BigFloat, elapsed: Duration) -> Self {
        let decimals_computed = reference::count_correct_decimals(&pi, config.digits);
        Self {
            iterations: config.iterations(),
            config,
            pi,
            decimals_computed,
            elapsed,
        }
    }

    /// Pi truncated to the requested number of decimals.
    pub fn pi_string(&self) -> String {
        self.pi.to_decimal_string(self.config.digits as usize)
    }
}

/// Picks the most informative error of a failed group: a rank's own
/// failure is preferred over the transport errors it caused elsewhere.
fn first_cause(errors: Vec<PiError>) -> PiError {
    let mut fallback = None;
    for err in errors {
        match err {
            PiError::Transport(_) => {
                fallback.get_or_insert(err);
            }
            cause => return cause,
        }
    }
    fallback.unwrap_or_else(|| PiError::Transport("root produced no result".to_string()))
}

/// Computes Pi with `config.procs` in-process ranks of `config.threads` threads each.
///
/// # Errors
/// * Any validation error of [`PiConfig::validate`], before work starts.
/// * The first arithmetic, codec or transport error raised by a rank.
pub fn compute_pi(config: &PiConfig) -> PiResult<PiReport> {
    config.validate()?;
    info!(
        digits = config.digits,
        procs = config.procs,
        threads = config.threads,
        algorithm = config.algorithm.name(),
        iterations = config.iterations(),
        "computing pi"
    );

    let start = Instant::now();
    let config = *config;
    let results: Vec<PiResult<Option<BigFloat>>> = std::thread::scope(|s| {
        let handles: Vec<_> = LocalGroup::create(config.procs)
            .into_iter()
            .map(|mut comm| s.spawn(move || run_rank(&config, &mut comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(PiError::Transport("rank panicked".to_string())))
            })
            .collect()
    });
    let elapsed = start.elapsed();

    let mut pi = None;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(Some(value)) => pi = Some(value),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }
    let pi = match pi {
        Some(pi) if errors.is_empty() => pi,
        _ => return Err(first_cause(errors)),
    };

    let report = PiReport::new(config, pi, elapsed);
    info!(
        decimals = report.decimals_computed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "pi computed"
    );
    Ok(report)
}
