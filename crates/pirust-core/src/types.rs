use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::config::{limits, precision};

/// Result alias used throughout the crate.
pub type PiResult<T> = Result<T, PiError>;

/// Error type for Pi calculations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PiError {
    /// Requested precision is zero.
    #[error("Precision should be greater than zero")]
    InvalidPrecision,

    /// Requested precision exceeds the supported maximum.
    #[error("Precision of {digits} digits is too large (max supported: {max})")]
    PrecisionTooLarge { digits: u64, max: u64 },

    /// Zero processes or zero threads were requested.
    #[error("At least one process and one thread are required (got {procs} processes, {threads} threads)")]
    InvalidWorkerCount { procs: usize, threads: usize },

    /// Not enough series terms to give every worker at least one.
    #[error(
        "The number of iterations required for the computation ({iterations}) is too small \
         to be solved with {threads} threads and {procs} processes. \
         Try using a greater precision or lower threads/processes number"
    )]
    InsufficientIterations {
        iterations: u64,
        threads: usize,
        procs: usize,
    },

    /// Unknown algorithm selector.
    #[error(
        "Algorithm '{0}' is not supported. Try with: 0 (bbp), 1 (bellard), \
         2 (chudnovsky-blocks), 3 (chudnovsky)"
    )]
    UnsupportedAlgorithm(String),

    /// Division by an exact zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Square root of a negative value.
    #[error("Square root of a negative value")]
    NegativeSqrt,

    /// A value does not fit the payload bound of the configured precision.
    #[error("Payload of {len} bytes exceeds the bound of {max} bytes")]
    PayloadOverflow { len: usize, max: usize },

    /// A received payload could not be decoded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The reduction channel to another rank failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The worker thread pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

// ============================================================================
// Precision
// ============================================================================

/// Working precision of one computation, in bits.
///
/// Every [`BigFloat`](crate::BigFloat) is created with an explicit
/// `Precision`; all values taking part in one run must share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precision(u64);

impl Precision {
    /// Creates a precision of exactly `bits` bits (at least 1).
    pub const fn from_bits(bits: u64) -> Self {
        if bits == 0 {
            Precision(1)
        } else {
            Precision(bits)
        }
    }

    /// Working precision for `digits` decimal digits.
    ///
    /// Uses [`precision::BITS_PER_DIGIT`] bits per digit, floored at
    /// [`precision::MIN_PRECISION_BITS`] and rounded up to whole limbs.
    pub fn for_digits(digits: u64) -> Self {
        let raw = digits
            .saturating_mul(precision::BITS_PER_DIGIT)
            .max(precision::MIN_PRECISION_BITS);
        let limbs = raw.div_ceil(precision::LIMB_BITS);
        Precision(limbs * precision::LIMB_BITS)
    }

    /// Number of mantissa bits.
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Number of 64-bit limbs needed to hold a full mantissa.
    #[inline]
    pub fn limbs(self) -> u64 {
        self.0.div_ceil(precision::LIMB_BITS)
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bits", self.0)
    }
}

// ============================================================================
// Algorithm Selection
// ============================================================================

/// Series selection.
///
/// The numeric selectors `0..=3` are accepted alongside the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Bailey-Borwein-Plouffe: blocks per process, cyclic per thread.
    Bbp,

    /// Bellard: blocks per process, cyclic per thread.
    Bellard,

    /// Chudnovsky: blocks per process, contiguous sub-blocks per thread.
    ChudnovskyBlocks,

    /// Chudnovsky: blocks per process, cyclic per thread.
    #[default]
    Chudnovsky,
}

impl Algorithm {
    /// All selectable algorithms, in selector order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Bbp,
        Algorithm::Bellard,
        Algorithm::ChudnovskyBlocks,
        Algorithm::Chudnovsky,
    ];

    /// Numeric selector of this algorithm.
    pub fn index(self) -> u8 {
        match self {
            Algorithm::Bbp => 0,
            Algorithm::Bellard => 1,
            Algorithm::ChudnovskyBlocks => 2,
            Algorithm::Chudnovsky => 3,
        }
    }

    /// Short name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bbp => "bbp",
            Algorithm::Bellard => "bellard",
            Algorithm::ChudnovskyBlocks => "chudnovsky-blocks",
            Algorithm::Chudnovsky => "chudnovsky",
        }
    }

    /// Number of series terms needed for `digits` decimal digits.
    pub fn iterations_for(self, digits: u64) -> u64 {
        use crate::config::iterations::*;
        match self {
            Algorithm::Bbp => (digits as f64 * BBP_ITERATIONS_PER_DIGIT) as u64,
            Algorithm::Bellard => digits / BELLARD_DIGITS_PER_ITERATION,
            Algorithm::ChudnovskyBlocks | Algorithm::Chudnovsky => {
                digits.div_ceil(CHUDNOVSKY_DIGITS_PER_ITERATION)
            }
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Bbp => write!(
                f,
                "BBP (Processes distribute the iterations in blocks and threads do it cyclically)"
            ),
            Algorithm::Bellard => write!(
                f,
                "Bellard (Processes distribute the iterations in blocks and threads do it cyclically)"
            ),
            Algorithm::ChudnovskyBlocks => write!(
                f,
                "Chudnovsky (Processes and threads distribute the iterations in blocks)"
            ),
            Algorithm::Chudnovsky => write!(
                f,
                "Chudnovsky (Processes distribute the iterations in blocks and threads do it cyclically)"
            ),
        }
    }
}

impl FromStr for Algorithm {
    type Err = PiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| key == a.name() || key == a.index().to_string())
            .ok_or_else(|| PiError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Validated run parameters shared by every rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiConfig {
    /// Requested decimal digits.
    pub digits: u64,
    /// Number of ranks (processes).
    pub procs: usize,
    /// Worker threads per rank.
    pub threads: usize,
    /// Series to evaluate.
    pub algorithm: Algorithm,
}

impl PiConfig {
    pub fn new(digits: u64, procs: usize, threads: usize, algorithm: Algorithm) -> Self {
        Self {
            digits,
            procs,
            threads,
            algorithm,
        }
    }

    /// Working precision of this run.
    #[inline]
    pub fn precision(&self) -> Precision {
        Precision::for_digits(self.digits)
    }

    /// Total number of series terms of this run.
    #[inline]
    pub fn iterations(&self) -> u64 {
        self.algorithm.iterations_for(self.digits)
    }

    /// Pre-flight validation, performed once before any worker starts.
    ///
    /// # Errors
    /// * `PiError::InvalidPrecision` if `digits` is zero.
    /// * `PiError::PrecisionTooLarge` above [`limits::MAX_DIGITS`].
    /// * `PiError::InvalidWorkerCount` if `procs` or `threads` is zero.
    /// * `PiError::InsufficientIterations` if there are fewer terms than workers.
    pub fn validate(&self) -> PiResult<()> {
        if self.digits == 0 {
            return Err(PiError::InvalidPrecision);
        }
        if self.digits > limits::MAX_DIGITS {
            return Err(PiError::PrecisionTooLarge {
                digits: self.digits,
                max: limits::MAX_DIGITS,
            });
        }
        if self.procs == 0 || self.threads == 0 {
            return Err(PiError::InvalidWorkerCount {
                procs: self.procs,
                threads: self.threads,
            });
        }
        let iterations = self.iterations();
        let workers = (self.procs as u64).saturating_mul(self.threads as u64);
        if iterations < workers {
            return Err(PiError::InsufficientIterations {
                iterations,
                threads: self.threads,
                procs: self.procs,
            });
        }
        Ok(())
    }
}
