//! Bailey-Borwein-Plouffe series.
//!
//! $$\pi = \sum_{k \ge 0} 16^{-k} \left( \frac{4}{8k+1} - \frac{2}{8k+4} - \frac{1}{8k+5} - \frac{1}{8k+6} \right)$$
//!
//! The weight $16^{-k}$ is a power of two, so it is carried exactly and
//! advanced by $16^{-T}$ per stride. The bracket is one exact rational.

use super::{rational_sum, Fraction, Series};
use crate::{BigFloat, PiResult, Precision};

/// The BBP series.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bbp;

/// Recurrence state of one BBP worker.
#[derive(Debug, Clone)]
pub struct BbpState {
    index: u64,
    stride: u64,
    weight: BigFloat,
    stride_weight: BigFloat,
}

impl BbpState {
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// `16^-k`
    #[inline]
    pub fn weight(&self) -> &BigFloat {
        &self.weight
    }
}

impl Series for Bbp {
    type State = BbpState;

    fn state_at(&self, index: u64, stride: u64, precision: Precision) -> PiResult<BbpState> {
        let stride = stride.max(1);
        let one = BigFloat::one(precision);
        Ok(BbpState {
            index,
            stride,
            weight: one.mul_pow2(-4 * index as i64),
            stride_weight: one.mul_pow2(-4 * stride as i64),
        })
    }

    fn accumulate(&self, state: &BbpState, sum: &mut BigFloat) -> PiResult<()> {
        let k8 = 8 * state.index;
        let bracket = rational_sum(
            &[
                Fraction::plus(4, k8 + 1),
                Fraction::minus(2, k8 + 4),
                Fraction::minus(1, k8 + 5),
                Fraction::minus(1, k8 + 6),
            ],
            state.weight.precision(),
        )?;
        *sum += &(&bracket * &state.weight);
        Ok(())
    }

    fn advance(&self, state: &mut BbpState) -> PiResult<()> {
        state.weight = &state.weight * &state.stride_weight;
        state.index += state.stride;
        Ok(())
    }

    fn assemble(&self, sum: &BigFloat) -> PiResult<BigFloat> {
        Ok(sum.clone())
    }
}
