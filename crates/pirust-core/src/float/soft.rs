//! Pure Rust backend: a `UBig` mantissa with an `i64` binary exponent.

use std::cmp::Ordering;

use ibig::UBig;

use crate::{PiError, PiResult, Precision};

/// Name of the arbitrary-precision library behind [`BigFloat`].
pub const BACKEND: &str = "ibig";

/// Arbitrary-precision float with an explicit working precision.
#[derive(Debug, Clone)]
pub struct BigFloat {
    negative: bool,
    mantissa: UBig,
    exponent: i64,
    precision: Precision,
}

impl BigFloat {
    /// The additive identity.
    pub fn zero(precision: Precision) -> Self {
        Self {
            negative: false,
            mantissa: UBig::from(0u8),
            exponent: 0,
            precision,
        }
    }

    /// Builds `±mantissa · 2^exponent`, truncated to `precision` bits.
    pub fn from_parts(
        precision: Precision,
        negative: bool,
        mut mantissa: UBig,
        mut exponent: i64,
    ) -> Self {
        let len = mantissa.bit_len() as u64;
        if len == 0 {
            return Self::zero(precision);
        }
        if len > precision.bits() {
            let excess = len - precision.bits();
            mantissa = mantissa >> excess as usize;
            exponent += excess as i64;
        }
        Self {
            negative,
            mantissa,
            exponent,
            precision,
        }
    }

    /// Splits the value into sign, mantissa and exponent, the inverse of
    /// [`from_parts`](Self::from_parts). Zero is `(false, 0, 0)`.
    pub fn to_parts(&self) -> (bool, UBig, i64) {
        (self.negative, self.mantissa.clone(), self.exponent)
    }

    /// Returns the same magnitude with the requested sign.
    pub fn with_sign(mut self, negative: bool) -> Self {
        self.negative = negative && !self.is_zero();
        self
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa.bit_len() == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Position just above the most significant bit: `|self| < 2^top`.
    #[inline]
    pub(super) fn top(&self) -> i64 {
        self.exponent + self.mantissa.bit_len() as i64
    }

    /// Compares magnitudes, ignoring signs.
    pub fn cmp_abs(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        match self.top().cmp(&other.top()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        let exponent = self.exponent.min(other.exponent);
        let a = &self.mantissa << (self.exponent - exponent) as usize;
        let b = &other.mantissa << (other.exponent - exponent) as usize;
        a.cmp(&b)
    }

    pub(super) fn add_signed(&self, other: &Self, negate_other: bool) -> Self {
        let other_negative = other.negative ^ negate_other;
        if other.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return Self::from_parts(
                self.precision,
                other_negative,
                other.mantissa.clone(),
                other.exponent,
            );
        }

        // An operand lying entirely below the other's lowest bit only matters
        // through its sign, so it is replaced by a single sticky bit there.
        // This bounds the alignment shift without changing the truncated sum.
        let reach = self
            .precision
            .bits()
            .max(self.mantissa.bit_len() as u64)
            .max(other.mantissa.bit_len() as u64) as i64
            + 1;
        let sticky = UBig::from(1u8);
        let (lhs, lhs_exp) = if other.top() - self.top() > reach {
            (&sticky, other.top() - reach - 1)
        } else {
            (&self.mantissa, self.exponent)
        };
        let (rhs, rhs_exp) = if self.top() - other.top() > reach {
            (&sticky, self.top() - reach - 1)
        } else {
            (&other.mantissa, other.exponent)
        };

        let exponent = lhs_exp.min(rhs_exp);
        let a = lhs << (lhs_exp - exponent) as usize;
        let b = rhs << (rhs_exp - exponent) as usize;

        let (negative, mantissa) = if self.negative == other_negative {
            (self.negative, a + b)
        } else {
            match a.cmp(&b) {
                Ordering::Greater => (self.negative, a - b),
                Ordering::Less => (other_negative, b - a),
                Ordering::Equal => return Self::zero(self.precision),
            }
        };
        Self::from_parts(self.precision, negative, mantissa, exponent)
    }

    pub(super) fn mul_impl(&self, other: &Self) -> Self {
        Self::from_parts(
            self.precision,
            self.negative ^ other.negative,
            &self.mantissa * &other.mantissa,
            self.exponent + other.exponent,
        )
    }

    /// Quotient `self / rhs`.
    ///
    /// # Errors
    /// * `PiError::DivisionByZero` if `rhs` is zero.
    pub fn try_div(&self, rhs: &Self) -> PiResult<Self> {
        if rhs.is_zero() {
            return Err(PiError::DivisionByZero);
        }
        if self.is_zero() {
            return Ok(Self::zero(self.precision));
        }
        // Widen the dividend so the integer quotient carries at least
        // `precision + 1` significant bits.
        let shift = (self.precision.bits() as i64 + rhs.mantissa.bit_len() as i64
            - self.mantissa.bit_len() as i64
            + 1)
        .max(0);
        let quotient = (&self.mantissa << shift as usize) / &rhs.mantissa;
        Ok(Self::from_parts(
            self.precision,
            self.negative ^ rhs.negative,
            quotient,
            self.exponent - rhs.exponent - shift,
        ))
    }

    /// Square root.
    ///
    /// # Errors
    /// * `PiError::NegativeSqrt` if `self` is negative.
    pub fn sqrt(&self) -> PiResult<Self> {
        if self.is_zero() {
            return Ok(Self::zero(self.precision));
        }
        if self.negative {
            return Err(PiError::NegativeSqrt);
        }
        let len = self.mantissa.bit_len() as i64;
        let mut shift = (2 * self.precision.bits() as i64 + 2 - len).max(0);
        if (self.exponent - shift).rem_euclid(2) != 0 {
            shift += 1;
        }
        let root = isqrt(&(&self.mantissa << shift as usize));
        Ok(Self::from_parts(
            self.precision,
            false,
            root,
            (self.exponent - shift) / 2,
        ))
    }

    /// Exact multiplication by `2^k`.
    pub fn mul_pow2(&self, k: i64) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        Self {
            exponent: self.exponent + k,
            ..self.clone()
        }
    }
}

/// Floor of the square root of `n` (Newton iteration from above).
fn isqrt(n: &UBig) -> UBig {
    if n.bit_len() == 0 {
        return UBig::from(0u8);
    }
    let mut x = UBig::from(1u8) << ((n.bit_len() + 1) / 2);
    loop {
        let y = (&x + n / &x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_floors() {
        assert_eq!(isqrt(&UBig::from(0u8)), UBig::from(0u8));
        assert_eq!(isqrt(&UBig::from(15u8)), UBig::from(3u8));
        assert_eq!(isqrt(&UBig::from(16u8)), UBig::from(4u8));
        assert_eq!(isqrt(&UBig::from(u64::MAX)), UBig::from(u32::MAX));
    }

    #[test]
    fn distant_operand_keeps_alignment_bounded() {
        let p = Precision::from_bits(128);
        let huge = BigFloat::from_u64(p, 1).mul_pow2(1 << 40);
        let one = BigFloat::from_u64(p, 1);
        let diff = &huge - &one;
        let (negative, mantissa, exponent) = diff.to_parts();
        assert!(!negative);
        assert_eq!(mantissa.bit_len() as u64, p.bits());
        assert_eq!(exponent, (1 << 40) - 128);
    }
}
