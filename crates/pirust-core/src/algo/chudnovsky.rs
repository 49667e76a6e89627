//! Chudnovsky series with an O(1) per-term recurrence.
//!
//! $$\frac{D\sqrt{E}}{\pi} = \sum_{n \ge 0} \underbrace{\frac{(6n)!}{(n!)^3(3n)!}}_{\text{ratio}}
//! \cdot \frac{\overbrace{Bn + A}^{\text{linear}}}{\underbrace{(-C)^{3n}}_{\text{power}}}$$
//!
//! # Recurrences
//!
//! - $\text{ratio}(n+1) = \text{ratio}(n) \cdot \frac{(12n+2)(12n+6)(12n+10)}{(n+1)^3}$
//! - $\text{power}(n+1) = \text{power}(n) \cdot (-C)^3$
//! - $\text{linear}(n+1) = \text{linear}(n) + B$
//!
//! A worker with stride $T$ folds $T$ single steps into one advance: the
//! small integer factors of the ratio are multiplied exactly, then applied
//! with one float multiplication and one division; the power term is
//! multiplied by $(-C)^{3T}$ and the linear term grows by $B \cdot T$.
//!
//! Factorials are only evaluated by [`Series::state_at`], once per worker.

use ibig::UBig;

use super::Series;
use crate::config::chudnovsky::{A, B, C, D, E};
use crate::float::factorial;
use crate::{BigFloat, PiResult, Precision};

/// The Chudnovsky series.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chudnovsky;

/// Recurrence state of one Chudnovsky worker.
#[derive(Debug, Clone)]
pub struct ChudnovskyState {
    index: u64,
    stride: u64,
    ratio: BigFloat,
    power_term: BigFloat,
    linear_term: BigFloat,
    stride_power: BigFloat,
}

impl ChudnovskyState {
    /// Term index the state currently points at.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// `(6n)! / ((n!)^3 (3n)!)`
    #[inline]
    pub fn ratio(&self) -> &BigFloat {
        &self.ratio
    }

    /// `(-C)^(3n)`
    #[inline]
    pub fn power_term(&self) -> &BigFloat {
        &self.power_term
    }

    /// `A + B n`
    #[inline]
    pub fn linear_term(&self) -> &BigFloat {
        &self.linear_term
    }

    /// The term `ratio * linear / power`.
    pub fn term(&self) -> PiResult<BigFloat> {
        (&self.ratio * &self.linear_term).try_div(&self.power_term)
    }
}

/// `(-C)^(3 * steps)`.
fn base_power(steps: u64, precision: Precision) -> BigFloat {
    let cube = BigFloat::from_u64(precision, C * C * C);
    cube.pow(steps).with_sign(steps % 2 == 1)
}

impl Series for Chudnovsky {
    type State = ChudnovskyState;

    fn state_at(&self, index: u64, stride: u64, precision: Precision) -> PiResult<ChudnovskyState> {
        let n_fact = factorial(index);
        let multinomial = factorial(6 * index) / (n_fact.pow(3) * factorial(3 * index));
        let linear = UBig::from(A) + UBig::from(B) * UBig::from(index);

        Ok(ChudnovskyState {
            index,
            stride: stride.max(1),
            ratio: BigFloat::from_ubig(precision, multinomial),
            power_term: base_power(index, precision),
            linear_term: BigFloat::from_ubig(precision, linear),
            stride_power: base_power(stride.max(1), precision),
        })
    }

    fn accumulate(&self, state: &ChudnovskyState, sum: &mut BigFloat) -> PiResult<()> {
        *sum += &state.term()?;
        Ok(())
    }

    fn advance(&self, state: &mut ChudnovskyState) -> PiResult<()> {
        let precision = state.ratio.precision();
        let mut numerator = UBig::from(1u8);
        let mut denominator = UBig::from(1u8);
        for m in state.index..state.index + state.stride {
            let k = 12 * m;
            numerator = numerator * UBig::from(k + 2) * UBig::from(k + 6) * UBig::from(k + 10);
            denominator = denominator * UBig::from(m + 1).pow(3);
        }

        state.ratio = (&state.ratio * &BigFloat::from_ubig(precision, numerator))
            .try_div(&BigFloat::from_ubig(precision, denominator))?;
        state.power_term = &state.power_term * &state.stride_power;
        let linear_step = UBig::from(B) * UBig::from(state.stride);
        state.linear_term += &BigFloat::from_ubig(precision, linear_step);
        state.index += state.stride;
        Ok(())
    }

    /// `D * sqrt(E) / sum`
    fn assemble(&self, sum: &BigFloat) -> PiResult<BigFloat> {
        let precision = sum.precision();
        let scale = &BigFloat::from_u64(precision, E).sqrt()? * &BigFloat::from_u64(precision, D);
        scale.try_div(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> Precision {
        Precision::for_digits(80)
    }

    #[test]
    fn state_at_zero_is_the_leading_term() {
        let state = Chudnovsky.state_at(0, 1, p()).unwrap();
        assert_eq!(state.ratio(), &BigFloat::one(p()));
        assert_eq!(state.power_term(), &BigFloat::one(p()));
        assert_eq!(state.linear_term(), &BigFloat::from_u64(p(), A));
        assert_eq!(state.term().unwrap(), BigFloat::from_u64(p(), A));
    }

    #[test]
    fn state_at_one_matches_closed_form() {
        let state = Chudnovsky.state_at(1, 1, p()).unwrap();
        // 6! / (1 * 3!) = 120
        assert_eq!(state.ratio(), &BigFloat::from_u64(p(), 120));
        assert!(state.power_term().is_negative());
        assert_eq!(
            state.power_term(),
            &-BigFloat::from_u64(p(), 262_537_412_640_768_000)
        );
        assert_eq!(state.linear_term(), &BigFloat::from_u64(p(), A + B));
    }

    #[test]
    fn single_step_advance_matches_direct_initialization() {
        let mut state = Chudnovsky.state_at(0, 1, p()).unwrap();
        for n in 1..=12 {
            Chudnovsky.advance(&mut state).unwrap();
            let direct = Chudnovsky.state_at(n, 1, p()).unwrap();
            assert_eq!(state.index(), n);
            assert!(state.ratio().approx_eq(direct.ratio(), 16), "ratio at n={n}");
            assert!(state.power_term().approx_eq(direct.power_term(), 16), "power at n={n}");
            assert_eq!(state.linear_term(), direct.linear_term(), "linear at n={n}");
        }
    }

    #[test]
    fn strided_advance_matches_direct_initialization() {
        let mut state = Chudnovsky.state_at(3, 4, p()).unwrap();
        for n in [7u64, 11, 15] {
            Chudnovsky.advance(&mut state).unwrap();
            let direct = Chudnovsky.state_at(n, 4, p()).unwrap();
            assert!(state.ratio().approx_eq(direct.ratio(), 16), "ratio at n={n}");
            assert!(state.power_term().approx_eq(direct.power_term(), 16), "power at n={n}");
            assert_eq!(state.linear_term(), direct.linear_term());
            assert!(state.term().unwrap().approx_eq(&direct.term().unwrap(), 16));
        }
    }

    #[test]
    fn one_term_gives_pi_to_thirteen_digits() {
        let mut sum = BigFloat::zero(p());
        let state = Chudnovsky.state_at(0, 1, p()).unwrap();
        Chudnovsky.accumulate(&state, &mut sum).unwrap();
        let pi = Chudnovsky.assemble(&sum).unwrap();
        assert!(pi.to_decimal_string(13).starts_with("3.1415926535897"));
    }

    #[test]
    fn assemble_rejects_zero_sum() {
        assert!(Chudnovsky.assemble(&BigFloat::zero(p())).is_err());
    }
}
