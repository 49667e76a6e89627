//! GMP/MPFR backend through `rug::Float`, rounding toward zero.

use std::cmp::Ordering;

use ibig::UBig;
use rug::float::Round;
use rug::integer::Order;
use rug::ops::NegAssign;
use rug::{Float, Integer};

use crate::{PiError, PiResult, Precision};

/// Name of the arbitrary-precision library behind [`BigFloat`].
pub const BACKEND: &str = "mpfr";

/// Arbitrary-precision float with an explicit working precision.
#[derive(Debug, Clone)]
pub struct BigFloat {
    value: Float,
    precision: Precision,
}

/// MPFR precision for `precision`, clamped to the range MPFR accepts.
fn mpfr_prec(precision: Precision) -> u32 {
    u32::try_from(precision.bits())
        .unwrap_or(u32::MAX)
        .clamp(rug::float::prec_min(), rug::float::prec_max())
}

/// Binary shift for `<<=`; MPFR exponents are 32-bit.
fn shift(k: i64) -> i32 {
    k.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl BigFloat {
    fn new(mut value: Float, precision: Precision) -> Self {
        if value.is_zero() && value.is_sign_negative() {
            value.neg_assign();
        }
        Self { value, precision }
    }

    /// The additive identity.
    pub fn zero(precision: Precision) -> Self {
        Self::new(Float::new(mpfr_prec(precision)), precision)
    }

    /// Builds `±mantissa · 2^exponent`, truncated to `precision` bits.
    pub fn from_parts(precision: Precision, negative: bool, mantissa: UBig, exponent: i64) -> Self {
        let integer = Integer::from_digits(&mantissa.to_le_bytes(), Order::Lsf);
        let (mut value, _) = Float::with_val_round(mpfr_prec(precision), &integer, Round::Zero);
        value <<= shift(exponent);
        if negative {
            value.neg_assign();
        }
        Self::new(value, precision)
    }

    /// Splits the value into sign, mantissa and exponent, the inverse of
    /// [`from_parts`](Self::from_parts). Zero is `(false, 0, 0)`.
    pub fn to_parts(&self) -> (bool, UBig, i64) {
        match self.value.to_integer_exp() {
            Some((integer, exponent)) if !self.value.is_zero() => {
                let digits = integer.as_abs().to_digits::<u8>(Order::Lsf);
                (
                    self.is_negative(),
                    UBig::from_le_bytes(&digits),
                    i64::from(exponent),
                )
            }
            _ => (false, UBig::from(0u8), 0),
        }
    }

    /// Returns the same magnitude with the requested sign.
    pub fn with_sign(mut self, negative: bool) -> Self {
        if self.value.is_sign_negative() != (negative && !self.value.is_zero()) {
            self.value.neg_assign();
        }
        self
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Position just above the most significant bit: `|self| < 2^top`.
    #[inline]
    pub(super) fn top(&self) -> i64 {
        self.value.get_exp().map_or(0, i64::from)
    }

    /// Compares magnitudes, ignoring signs.
    pub fn cmp_abs(&self, other: &Self) -> Ordering {
        self.value.cmp_abs(&other.value).unwrap_or(Ordering::Equal)
    }

    pub(super) fn add_signed(&self, other: &Self, negate_other: bool) -> Self {
        let prec = mpfr_prec(self.precision);
        let (value, _) = if negate_other {
            Float::with_val_round(prec, &self.value - &other.value, Round::Zero)
        } else {
            Float::with_val_round(prec, &self.value + &other.value, Round::Zero)
        };
        Self::new(value, self.precision)
    }

    pub(super) fn mul_impl(&self, other: &Self) -> Self {
        let prec = mpfr_prec(self.precision);
        let (value, _) = Float::with_val_round(prec, &self.value * &other.value, Round::Zero);
        Self::new(value, self.precision)
    }

    /// Quotient `self / rhs`.
    ///
    /// # Errors
    /// * `PiError::DivisionByZero` if `rhs` is zero.
    pub fn try_div(&self, rhs: &Self) -> PiResult<Self> {
        if rhs.is_zero() {
            return Err(PiError::DivisionByZero);
        }
        let prec = mpfr_prec(self.precision);
        let (value, _) = Float::with_val_round(prec, &self.value / &rhs.value, Round::Zero);
        Ok(Self::new(value, self.precision))
    }

    /// Square root.
    ///
    /// # Errors
    /// * `PiError::NegativeSqrt` if `self` is negative.
    pub fn sqrt(&self) -> PiResult<Self> {
        if self.is_negative() {
            return Err(PiError::NegativeSqrt);
        }
        let prec = mpfr_prec(self.precision);
        let (value, _) = Float::with_val_round(prec, self.value.sqrt_ref(), Round::Zero);
        Ok(Self::new(value, self.precision))
    }

    /// Exact multiplication by `2^k`.
    pub fn mul_pow2(&self, k: i64) -> Self {
        let mut value = self.value.clone();
        value <<= shift(k);
        Self::new(value, self.precision)
    }
}
