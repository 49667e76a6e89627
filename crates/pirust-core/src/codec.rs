//! Serialized payload used to move a [`BigFloat`] across the rank boundary.
//!
//! # Layout
//!
//! ```text
//! byte 0        sign (0 = non-negative, 1 = negative)
//! bytes 1..9    exponent, i64 little-endian
//! bytes 9..13   limb count, u32 little-endian
//! bytes 13..    limbs, u64 little-endian, least significant first
//! ```
//!
//! The buffer never exceeds [`max_payload_len`], which depends only on the
//! configured [`Precision`]. Both ends compute the bound from the same
//! precision, so an undersized buffer cannot occur silently: encoding a value
//! wider than the bound fails with `PiError::PayloadOverflow`.
//!
//! Transports that need every rank to send the same number of bytes use
//! fixed-width slots: a payload zero-padded to [`max_payload_len`]. A slot
//! whose sign byte is [`POISONED_SIGN`] carries no value and marks a failed
//! combination; it absorbs every slot it is folded with.

use ibig::UBig;

pub use crate::config::codec::POISONED_SIGN;

use crate::config::codec::{HEADER_LEN, LIMB_BYTES};
use crate::{BigFloat, PiError, PiResult, Precision};

/// Upper bound, in bytes, of an encoded value at `precision`.
///
/// $$\text{HEADER\_LEN} + 8 \cdot (\lceil \text{bits} / 64 \rceil + 1)$$
///
/// The spare limb leaves room for a mantissa produced by another rank whose
/// rounding carried into one extra bit.
#[inline]
pub fn max_payload_len(precision: Precision) -> usize {
    HEADER_LEN + LIMB_BYTES * (precision.limbs() as usize + 1)
}

/// Encodes `value` into a payload bounded by [`max_payload_len`].
///
/// # Errors
/// * `PiError::PayloadOverflow` if the mantissa is wider than the bound allows.
pub fn encode(value: &BigFloat, precision: Precision) -> PiResult<Vec<u8>> {
    let max = max_payload_len(precision);

    let (negative, mantissa, exponent) = value.to_parts();
    let mut limb_bytes = if value.is_zero() {
        Vec::new()
    } else {
        mantissa.to_le_bytes()
    };
    let limbs = limb_bytes.len().div_ceil(LIMB_BYTES);
    limb_bytes.resize(limbs * LIMB_BYTES, 0);

    let len = HEADER_LEN + limb_bytes.len();
    if len > max {
        return Err(PiError::PayloadOverflow { len, max });
    }

    let mut buffer = Vec::with_capacity(max);
    buffer.push(u8::from(negative));
    buffer.extend_from_slice(&exponent.to_le_bytes());
    buffer.extend_from_slice(&(limbs as u32).to_le_bytes());
    buffer.extend_from_slice(&limb_bytes);
    Ok(buffer)
}

/// Decodes a payload produced by [`encode`] at the same `precision`.
///
/// # Errors
/// * `PiError::PayloadOverflow` if the buffer is longer than the bound.
/// * `PiError::MalformedPayload` on a short header, a bad sign byte, or a
///   limb count that disagrees with the buffer length.
pub fn decode(bytes: &[u8], precision: Precision) -> PiResult<BigFloat> {
    let max = max_payload_len(precision);
    if bytes.len() > max {
        return Err(PiError::PayloadOverflow {
            len: bytes.len(),
            max,
        });
    }
    if bytes.len() < HEADER_LEN {
        return Err(PiError::MalformedPayload(format!(
            "{} bytes is shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }

    let negative = match bytes[0] {
        0 => false,
        1 => true,
        other => {
            return Err(PiError::MalformedPayload(format!("invalid sign byte {other}")));
        }
    };

    let mut exponent = [0u8; 8];
    exponent.copy_from_slice(&bytes[1..9]);
    let exponent = i64::from_le_bytes(exponent);

    let mut limbs = [0u8; 4];
    limbs.copy_from_slice(&bytes[9..HEADER_LEN]);
    let limbs = u32::from_le_bytes(limbs) as usize;

    let body = &bytes[HEADER_LEN..];
    if body.len() != limbs * LIMB_BYTES {
        return Err(PiError::MalformedPayload(format!(
            "header announces {limbs} limbs but {} bytes follow",
            body.len()
        )));
    }

    let mantissa = UBig::from_le_bytes(body);
    Ok(BigFloat::from_parts(precision, false, mantissa, exponent).with_sign(negative))
}

/// The associative combining function of the cross-rank reduction:
/// `encode(decode(a) + decode(b))`.
///
/// Returned as a value so it can be handed to
/// [`Communicator::reduce_to_root`](crate::comm::Communicator::reduce_to_root).
pub fn combine(
    precision: Precision,
) -> impl Fn(&[u8], &[u8]) -> PiResult<Vec<u8>> + Send + Sync + Copy {
    move |a: &[u8], b: &[u8]| {
        let lhs = decode(a, precision)?;
        let rhs = decode(b, precision)?;
        encode(&(&lhs + &rhs), precision)
    }
}

/// Length of the encoded value at the start of `bytes`, as announced by its
/// header. Trailing bytes (slot padding) are ignored.
///
/// # Errors
/// * `PiError::MalformedPayload` on a short header or a limb count that
///   runs past the end of `bytes`.
pub fn encoded_len(bytes: &[u8]) -> PiResult<usize> {
    if bytes.len() < HEADER_LEN {
        return Err(PiError::MalformedPayload(format!(
            "{} bytes is shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    let mut limbs = [0u8; 4];
    limbs.copy_from_slice(&bytes[9..HEADER_LEN]);
    let len = HEADER_LEN + u32::from_le_bytes(limbs) as usize * LIMB_BYTES;
    if len > bytes.len() {
        return Err(PiError::MalformedPayload(format!(
            "header announces {len} bytes but only {} are present",
            bytes.len()
        )));
    }
    Ok(len)
}

/// Zero-pads `payload` into a slot of exactly `width` bytes.
///
/// # Errors
/// * `PiError::PayloadOverflow` if the payload is wider than the slot.
pub fn pad(mut payload: Vec<u8>, width: usize) -> PiResult<Vec<u8>> {
    if payload.len() > width {
        return Err(PiError::PayloadOverflow {
            len: payload.len(),
            max: width,
        });
    }
    payload.resize(width, 0);
    Ok(payload)
}

/// Folds the slot `incoming` into the slot `inout` in place:
/// `inout = combine(incoming, inout)`, zero-padded back to the slot width.
///
/// Errors cannot be returned from inside a collective, so a failed
/// combination poisons `inout` instead; a poisoned input poisons the output.
pub fn fold_slots<F>(combine: &F, incoming: &[u8], inout: &mut [u8])
where
    F: Fn(&[u8], &[u8]) -> PiResult<Vec<u8>>,
{
    let poisoned = |slot: &[u8]| slot.first() == Some(&POISONED_SIGN);
    if poisoned(incoming) || poisoned(inout) {
        poison(inout);
        return;
    }

    let folded = match (encoded_len(incoming), encoded_len(inout)) {
        (Ok(a), Ok(b)) => combine(&incoming[..a], &inout[..b]),
        _ => {
            poison(inout);
            return;
        }
    };
    match folded {
        Ok(bytes) if bytes.len() <= inout.len() => {
            inout[..bytes.len()].copy_from_slice(&bytes);
            inout[bytes.len()..].fill(0);
        }
        _ => poison(inout),
    }
}

fn poison(slot: &mut [u8]) {
    if let Some(sign) = slot.first_mut() {
        *sign = POISONED_SIGN;
    }
}

/// Recovers the payload held by a slot.
///
/// # Errors
/// * `PiError::Transport` if the slot was poisoned by a failed combination.
/// * `PiError::MalformedPayload` if the header is inconsistent.
pub fn unpad(slot: &[u8]) -> PiResult<&[u8]> {
    if slot.first() == Some(&POISONED_SIGN) {
        return Err(PiError::Transport(
            "a rank failed to combine its payload during the reduction".into(),
        ));
    }
    Ok(&slot[..encoded_len(slot)?])
}
