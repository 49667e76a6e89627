//! Bellard's series.
//!
//! $$\pi = \frac{1}{2^6} \sum_{n \ge 0} \frac{(-1)^n}{2^{10n}} \left( -\frac{2^5}{4n+1} - \frac{1}{4n+3}
//! + \frac{2^8}{10n+1} - \frac{2^6}{10n+3} - \frac{2^2}{10n+5} - \frac{2^2}{10n+7} + \frac{1}{10n+9} \right)$$

use super::{rational_sum, Fraction, Series};
use crate::{BigFloat, PiResult, Precision};

/// The Bellard series.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bellard;

/// Recurrence state of one Bellard worker: the signed weight `(-1)^n 2^-10n`.
#[derive(Debug, Clone)]
pub struct BellardState {
    index: u64,
    stride: u64,
    weight: BigFloat,
    stride_weight: BigFloat,
}

fn signed_weight(steps: u64, precision: Precision) -> BigFloat {
    BigFloat::one(precision)
        .mul_pow2(-10 * steps as i64)
        .with_sign(steps % 2 == 1)
}

impl Series for Bellard {
    type State = BellardState;

    fn state_at(&self, index: u64, stride: u64, precision: Precision) -> PiResult<BellardState> {
        let stride = stride.max(1);
        Ok(BellardState {
            index,
            stride,
            weight: signed_weight(index, precision),
            stride_weight: signed_weight(stride, precision),
        })
    }

    fn accumulate(&self, state: &BellardState, sum: &mut BigFloat) -> PiResult<()> {
        let n4 = 4 * state.index;
        let n10 = 10 * state.index;
        let bracket = rational_sum(
            &[
                Fraction::minus(32, n4 + 1),
                Fraction::minus(1, n4 + 3),
                Fraction::plus(256, n10 + 1),
                Fraction::minus(64, n10 + 3),
                Fraction::minus(4, n10 + 5),
                Fraction::minus(4, n10 + 7),
                Fraction::plus(1, n10 + 9),
            ],
            state.weight.precision(),
        )?;
        *sum += &(&bracket * &state.weight);
        Ok(())
    }

    fn advance(&self, state: &mut BellardState) -> PiResult<()> {
        state.weight = &state.weight * &state.stride_weight;
        state.index += state.stride;
        Ok(())
    }

    /// `sum / 2^6`
    fn assemble(&self, sum: &BigFloat) -> PiResult<BigFloat> {
        Ok(sum.mul_pow2(-6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_term_gives_three_digits() {
        let p = Precision::for_digits(30);
        let state = Bellard.state_at(0, 1, p).unwrap();
        let mut sum = BigFloat::zero(p);
        Bellard.accumulate(&state, &mut sum).unwrap();
        let pi = Bellard.assemble(&sum).unwrap();
        assert!(pi.to_decimal_string(3).starts_with("3.141"));
    }

    #[test]
    fn odd_terms_are_subtracted() {
        let p = Precision::for_digits(30);
        let state = Bellard.state_at(1, 1, p).unwrap();
        let mut sum = BigFloat::zero(p);
        Bellard.accumulate(&state, &mut sum).unwrap();
        assert!(sum.is_negative());
    }
}
