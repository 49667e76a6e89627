//! Reference digits of Pi and the "decimals computed" check.
//!
//! The reference is produced independently of the series under test, with
//! Machin's formula evaluated in fixed-point integer arithmetic:
//!
//! $$\pi = 16 \arctan\frac{1}{5} - 4 \arctan\frac{1}{239}$$

use ibig::UBig;

use crate::BigFloat;

/// Pi to 100 decimals.
pub const PI_100: &str = "3.\
1415926535897932384626433832795028841971693993751058209749445923\
078164062862089986280348253421170679";

/// Extra decimals carried while evaluating the reference.
const GUARD_DIGITS: usize = 10;

/// `arctan(1/x) * scale`, truncated.
fn arctan_inv(x: u64, scale: &UBig) -> UBig {
    let x_squared = UBig::from(x) * UBig::from(x);
    let mut power = scale / UBig::from(x);
    let mut positive = power.clone();
    let mut negative = UBig::from(0u8);

    let mut k = 1u64;
    loop {
        power = power / &x_squared;
        if power.bit_len() == 0 {
            break;
        }
        let term = &power / UBig::from(2 * k + 1);
        if k % 2 == 1 {
            negative += term;
        } else {
            positive += term;
        }
        k += 1;
    }
    positive - negative
}

/// Pi with `decimals` fractional digits, truncated, as `"3.14…"`.
///
/// # Example
/// ```
/// assert_eq!(pirust_core::reference::pi_decimal(5), "3.14159");
/// ```
pub fn pi_decimal(decimals: usize) -> String {
    let scale = UBig::from(10u8).pow(decimals + GUARD_DIGITS);
    let pi = UBig::from(16u8) * arctan_inv(5, &scale) - UBig::from(4u8) * arctan_inv(239, &scale);
    let digits = (pi / UBig::from(10u8).pow(GUARD_DIGITS)).to_string();

    let (integer, fraction) = digits.split_at(1);
    if decimals == 0 {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Number of leading fractional digits on which two renderings agree.
///
/// Returns 0 when the integer parts differ.
pub fn matching_decimals(computed: &str, reference: &str) -> u64 {
    let (integer, fraction) = computed.split_once('.').unwrap_or((computed, ""));
    let (ref_integer, ref_fraction) = reference.split_once('.').unwrap_or((reference, ""));
    if integer != ref_integer {
        return 0;
    }
    fraction
        .bytes()
        .zip(ref_fraction.bytes())
        .take_while(|(a, b)| a == b)
        .count() as u64
}

/// Counts how many of the first `decimals` fractional digits of `pi` are correct.
pub fn count_correct_decimals(pi: &BigFloat, decimals: u64) -> u64 {
    let decimals = decimals as usize;
    matching_decimals(&pi.to_decimal_string(decimals), &pi_decimal(decimals))
}
