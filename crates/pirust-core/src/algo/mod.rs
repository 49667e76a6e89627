//! Series implementations and the thread-level summation engine.
//!
//! Every series is expressed through the [`Series`] trait: a worker state
//! that can be initialized directly at any term index, advanced by a fixed
//! stride in O(1) big-number operations, and folded into a running sum.
//! The summation engine in [`summation`] is shared by all of them.
//!
//! # Series
//!
//! - **Chudnovsky (`chudnovsky`)**: ~14 digits per term, factorial ratio
//!   advanced by a closed-form recurrence.
//! - **BBP (`bbp`)**: ~1.2 digits per term, power-of-16 weights.
//! - **Bellard (`bellard`)**: ~3 digits per term, alternating powers of 2^10.

use std::ops::Range;

use ibig::UBig;

use crate::partition::ThreadSplit;
use crate::{Algorithm, BigFloat, PiResult, Precision};

pub mod bbp;
pub mod bellard;
pub mod chudnovsky;
pub mod summation;

pub use bbp::Bbp;
pub use bellard::Bellard;
pub use chudnovsky::{Chudnovsky, ChudnovskyState};
pub use summation::{sum_block, sum_sequential};

/// A convergent series evaluated term by term from an explicit worker state.
pub trait Series: Sync {
    /// Per-worker recurrence state. Owned by exactly one thread.
    type State: Send;

    /// Directly initializes the state at term `index`; subsequent calls to
    /// [`advance`](Series::advance) move it by `stride` terms.
    fn state_at(&self, index: u64, stride: u64, precision: Precision) -> PiResult<Self::State>;

    /// Adds the term the state currently points at into `sum`.
    fn accumulate(&self, state: &Self::State, sum: &mut BigFloat) -> PiResult<()>;

    /// Moves the state forward by its stride.
    fn advance(&self, state: &mut Self::State) -> PiResult<()>;

    /// Turns the fully reduced sum into the Pi approximation.
    fn assemble(&self, sum: &BigFloat) -> PiResult<BigFloat>;
}

impl Algorithm {
    /// How this algorithm divides a rank's block among threads.
    pub fn thread_split(self) -> ThreadSplit {
        match self {
            Algorithm::ChudnovskyBlocks => ThreadSplit::Blocks,
            Algorithm::Bbp | Algorithm::Bellard | Algorithm::Chudnovsky => ThreadSplit::Cyclic,
        }
    }
}

/// Sums the terms of `block` for `algorithm` with `threads` workers.
pub fn evaluate_block(
    algorithm: Algorithm,
    block: Range<u64>,
    threads: usize,
    precision: Precision,
) -> PiResult<BigFloat> {
    let split = algorithm.thread_split();
    match algorithm {
        Algorithm::Bbp => sum_block(&Bbp, block, threads, split, precision),
        Algorithm::Bellard => sum_block(&Bellard, block, threads, split, precision),
        Algorithm::ChudnovskyBlocks | Algorithm::Chudnovsky => {
            sum_block(&Chudnovsky, block, threads, split, precision)
        }
    }
}

/// Applies the closing step of `algorithm` to the fully reduced sum.
pub fn assemble(algorithm: Algorithm, sum: &BigFloat) -> PiResult<BigFloat> {
    match algorithm {
        Algorithm::Bbp => Bbp.assemble(sum),
        Algorithm::Bellard => Bellard.assemble(sum),
        Algorithm::ChudnovskyBlocks | Algorithm::Chudnovsky => Chudnovsky.assemble(sum),
    }
}

/// One summand `±coefficient / denominator` of a small rational bracket.
pub(crate) struct Fraction {
    pub negative: bool,
    pub coefficient: u64,
    pub denominator: u64,
}

impl Fraction {
    pub(crate) const fn plus(coefficient: u64, denominator: u64) -> Self {
        Self {
            negative: false,
            coefficient,
            denominator,
        }
    }

    pub(crate) const fn minus(coefficient: u64, denominator: u64) -> Self {
        Self {
            negative: true,
            coefficient,
            denominator,
        }
    }
}

/// Evaluates `Σ ±c_i / d_i` exactly over the common denominator and returns
/// it as a single float quotient.
pub(crate) fn rational_sum(fractions: &[Fraction], precision: Precision) -> PiResult<BigFloat> {
    let common = fractions
        .iter()
        .fold(UBig::from(1u8), |acc, f| acc * UBig::from(f.denominator));

    let mut positive = UBig::from(0u8);
    let mut negative = UBig::from(0u8);
    for f in fractions {
        let scaled = UBig::from(f.coefficient) * (&common / UBig::from(f.denominator));
        if f.negative {
            negative += scaled;
        } else {
            positive += scaled;
        }
    }

    let (is_negative, numerator) = if positive >= negative {
        (false, positive - negative)
    } else {
        (true, negative - positive)
    };
    BigFloat::from_ubig(precision, numerator)
        .with_sign(is_negative)
        .try_div(&BigFloat::from_ubig(precision, common))
}
