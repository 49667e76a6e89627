//! Configuration constants and tuning parameters for the Pi series.
//!
//! This module centralizes the series constants, precision policy and
//! iteration ratios so that the driver, the workers and the payload codec
//! agree on them.

/// Constants of the Chudnovsky series.
///
/// $$\frac{D\sqrt{E}}{\pi} = \sum_{n \ge 0} \frac{(6n)!\,(Bn + A)}{(n!)^3\,(3n)!\,(-C)^{3n}}$$
pub mod chudnovsky {
    /// Leading numerator constant (the linear term at $n = 0$).
    pub const A: u64 = 13_591_409;

    /// Linear increment of the numerator per term.
    pub const B: u64 = 545_140_134;

    /// Magnitude of the base of the power term. The base itself is $-C$.
    pub const C: u64 = 640_320;

    /// Multiplier of the closed-form scaling constant.
    pub const D: u64 = 426_880;

    /// Radicand of the closed-form scaling constant.
    pub const E: u64 = 10_005;
}

/// Working precision policy.
pub mod precision {
    /// Bits of working precision allotted per requested decimal digit.
    ///
    /// $\log_2 10 \approx 3.32$ bits are strictly needed; the remainder is
    /// headroom for truncation error accumulated over many terms.
    pub const BITS_PER_DIGIT: u64 = 8;

    /// Width of one mantissa limb. Precision is rounded up to whole limbs.
    pub const LIMB_BITS: u64 = 64;

    /// Floor applied to tiny requests so that a 1-digit run is still exact.
    pub const MIN_PRECISION_BITS: u64 = 128;
}

/// Iteration counts per requested decimal digit for each series.
pub mod iterations {
    /// BBP yields roughly 1.2 digits per term.
    pub const BBP_ITERATIONS_PER_DIGIT: f64 = 0.84;

    /// Bellard yields roughly 3 digits per term.
    pub const BELLARD_DIGITS_PER_ITERATION: u64 = 3;

    /// Chudnovsky yields roughly 14.18 digits per term; the count rounds up.
    pub const CHUDNOVSKY_DIGITS_PER_ITERATION: u64 = 14;
}

/// Memory and safety limits.
pub mod limits {
    /// Largest number of decimal digits accepted by the driver.
    pub const MAX_DIGITS: u64 = 10_000_000;
}

/// Serialized payload layout.
pub mod codec {
    /// Sign byte, `i64` exponent and `u32` limb count.
    pub const HEADER_LEN: usize = 1 + 8 + 4;

    /// Bytes per serialized limb.
    pub const LIMB_BYTES: usize = 8;

    /// Sign byte of a fixed-width slot whose combination failed.
    pub const POISONED_SIGN: u8 = 0xFF;
}
