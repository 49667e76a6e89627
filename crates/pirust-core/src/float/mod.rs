//! Arbitrary-precision binary floating point with an explicit precision.
//!
//! A [`BigFloat`] is `±mantissa · 2^exponent` with a mantissa of at most
//! `precision` bits. Every operation truncates its exact result toward zero
//! to the precision of the left operand, which keeps a run reproducible:
//! the same sequence of operations always yields the same bits.
//!
//! The precision is an explicit [`Precision`] carried by each value instead
//! of a process-wide setting, so workers can be built and tested in
//! isolation.
//!
//! Two backends provide the representation:
//!
//! - `ibig` (default): pure Rust, a `UBig` mantissa and an `i64` exponent.
//! - `mpfr` (`gmp` feature): `rug::Float` rounded toward zero.
//!
//! Both expose the same inherent API; the arithmetic operators, decimal
//! rendering and comparisons below are shared.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use ibig::UBig;

use crate::Precision;

#[cfg(not(feature = "gmp"))]
mod soft;
#[cfg(not(feature = "gmp"))]
pub use soft::{BigFloat, BACKEND};

#[cfg(feature = "gmp")]
mod mpfr;
#[cfg(feature = "gmp")]
pub use mpfr::{BigFloat, BACKEND};

impl BigFloat {
    /// The multiplicative identity.
    pub fn one(precision: Precision) -> Self {
        Self::from_u64(precision, 1)
    }

    pub fn from_u64(precision: Precision, value: u64) -> Self {
        Self::from_parts(precision, false, UBig::from(value), 0)
    }

    /// Converts an exact integer, truncating it to `precision` bits.
    pub fn from_ubig(precision: Precision, value: UBig) -> Self {
        Self::from_parts(precision, false, value, 0)
    }

    /// Raises `self` to a non-negative integer power by repeated squaring.
    pub fn pow(&self, mut exp: u64) -> Self {
        let mut result = Self::one(self.precision());
        let mut base = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = &result * &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Renders the value in base 10 with `decimals` fractional digits,
    /// truncated toward zero.
    ///
    /// # Example
    /// ```
    /// use pirust_core::{BigFloat, Precision};
    ///
    /// let p = Precision::from_bits(128);
    /// let x = BigFloat::from_u64(p, 22).try_div(&BigFloat::from_u64(p, 7)).unwrap();
    /// assert_eq!(x.to_decimal_string(5), "3.14285");
    /// ```
    pub fn to_decimal_string(&self, decimals: usize) -> String {
        let (negative, mantissa, exponent) = self.to_parts();
        let scaled = mantissa * UBig::from(10u8).pow(decimals);
        let integer = if exponent >= 0 {
            scaled << exponent as usize
        } else {
            scaled >> exponent.unsigned_abs() as usize
        };

        let mut digits = integer.to_string();
        if digits.len() <= decimals {
            digits = "0".repeat(decimals + 1 - digits.len()) + &digits;
        }
        let split = digits.len() - decimals;

        let mut out = String::with_capacity(digits.len() + 2);
        if negative && integer.bit_len() > 0 {
            out.push('-');
        }
        out.push_str(&digits[..split]);
        if decimals > 0 {
            out.push('.');
            out.push_str(&digits[split..]);
        }
        out
    }

    /// True when `self` and `other` agree to within `2^-(precision - slack_bits)`
    /// relative to the larger magnitude.
    pub fn approx_eq(&self, other: &Self, slack_bits: u64) -> bool {
        let diff = self - other;
        if diff.is_zero() {
            return true;
        }
        let larger = match self.cmp_abs(other) {
            Ordering::Less => other,
            _ => self,
        };
        let tolerance = self.precision().bits() as i64 - slack_bits as i64;
        larger.top() - diff.top() >= tolerance
    }
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.is_zero() || other.is_zero() {
            return self.is_zero() && other.is_zero();
        }
        self.is_negative() == other.is_negative() && self.cmp_abs(other) == Ordering::Equal
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let sign = |x: &Self| match (x.is_zero(), x.is_negative()) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        };
        Some(match sign(self).cmp(&sign(other)) {
            Ordering::Equal if sign(self) < 0 => other.cmp_abs(self),
            Ordering::Equal => self.cmp_abs(other),
            unequal => unequal,
        })
    }
}

impl<'a> Add<&'a BigFloat> for &'a BigFloat {
    type Output = BigFloat;

    #[inline]
    fn add(self, rhs: &'a BigFloat) -> BigFloat {
        self.add_signed(rhs, false)
    }
}

impl<'a> Sub<&'a BigFloat> for &'a BigFloat {
    type Output = BigFloat;

    #[inline]
    fn sub(self, rhs: &'a BigFloat) -> BigFloat {
        self.add_signed(rhs, true)
    }
}

impl<'a> Mul<&'a BigFloat> for &'a BigFloat {
    type Output = BigFloat;

    #[inline]
    fn mul(self, rhs: &'a BigFloat) -> BigFloat {
        self.mul_impl(rhs)
    }
}

impl AddAssign<&BigFloat> for BigFloat {
    #[inline]
    fn add_assign(&mut self, rhs: &BigFloat) {
        *self = self.add_signed(rhs, false);
    }
}

impl Neg for BigFloat {
    type Output = BigFloat;

    fn neg(self) -> BigFloat {
        let negative = !self.is_negative();
        self.with_sign(negative)
    }
}

/// Product of the integers in `[lo, hi)`; the empty product is 1.
///
/// Splits the range in halves so that the large multiplications happen
/// between operands of similar size.
pub fn product_range(lo: u64, hi: u64) -> UBig {
    match hi.saturating_sub(lo) {
        0 => UBig::from(1u8),
        1 => UBig::from(lo),
        2 => UBig::from(lo) * UBig::from(lo + 1),
        len => {
            let mid = lo + len / 2;
            product_range(lo, mid) * product_range(mid, hi)
        }
    }
}

/// Exact `n!`.
pub fn factorial(n: u64) -> UBig {
    product_range(1, n + 1)
}
