//! Variable-length quantity (VLQ) integers.
//!
//! Each octet carries seven payload bits, most significant group first, and
//! a continuation bit in `0x80`. Signed forms use bit `0x40` of the first
//! octet as the sign and pre-load the accumulator with ones. The 64-bit
//! forms read at most eight seven-bit groups; when the eighth still has its
//! continuation bit set, a ninth octet contributes a full unshifted byte.
//!
//! Decoders return the value together with the number of octets consumed so
//! callers can advance their cursor. They never read past `max_octets` and
//! only fail when the buffer ends first.

use crate::error::DecodeError;

/// Longest encoding of a 32-bit quantity.
pub const VARINT32_MAX_OCTETS: usize = 5;
/// Longest encoding of a 64-bit quantity, including the full ninth byte.
pub const VARINT64_MAX_OCTETS: usize = 9;
/// Seven-bit groups read before the ninth-octet rule applies.
const VARINT64_GROUPS: usize = 8;

const CONTINUATION: u8 = 0x80;
const SIGN: u8 = 0x40;
const PAYLOAD: u8 = 0x7f;

fn octet_at(buf: &[u8], pos: usize, index: usize) -> Result<u8, DecodeError> {
    let offset = pos.saturating_add(index);
    buf.get(offset).copied().ok_or(DecodeError::Truncated {
        offset,
        needed: 1,
        available: 0,
    })
}

/// Decode an unsigned 32-bit VLQ starting at `pos`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends before a
/// terminating octet is found.
///
/// # Examples
///
/// ```
/// use s7commp::vlq::decode_varuint32;
///
/// assert_eq!(decode_varuint32(&[0x89, 0x68], 0).unwrap(), (1256, 2));
/// ```
pub fn decode_varuint32(buf: &[u8], pos: usize) -> Result<(u32, usize), DecodeError> {
    decode_varuint32_within(buf, pos, VARINT32_MAX_OCTETS)
}

/// Decode an unsigned 32-bit VLQ reading at most `max_octets` octets.
///
/// `max_octets` is clamped to `1..=5`. When the last permitted octet still
/// carries a continuation bit the value accumulated so far is returned.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends first.
pub fn decode_varuint32_within(
    buf: &[u8],
    pos: usize,
    max_octets: usize,
) -> Result<(u32, usize), DecodeError> {
    let limit = max_octets.clamp(1, VARINT32_MAX_OCTETS);
    let mut value: u32 = 0;
    let mut count = 0;
    while count < limit {
        let octet = octet_at(buf, pos, count)?;
        count += 1;
        value = (value << 7) | u32::from(octet & PAYLOAD);
        if octet & CONTINUATION == 0 {
            break;
        }
    }
    Ok((value, count))
}

/// Decode a signed 32-bit VLQ starting at `pos`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends first.
///
/// # Examples
///
/// ```
/// use s7commp::vlq::decode_varint32;
///
/// assert_eq!(decode_varint32(&[0x7f], 0).unwrap(), (-1, 1));
/// ```
pub fn decode_varint32(buf: &[u8], pos: usize) -> Result<(i32, usize), DecodeError> {
    decode_varint32_within(buf, pos, VARINT32_MAX_OCTETS)
}

/// Decode a signed 32-bit VLQ reading at most `max_octets` octets.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends first.
pub fn decode_varint32_within(
    buf: &[u8],
    pos: usize,
    max_octets: usize,
) -> Result<(i32, usize), DecodeError> {
    let limit = max_octets.clamp(1, VARINT32_MAX_OCTETS);
    let mut value: u32 = 0;
    let mut count = 0;
    while count < limit {
        let mut octet = octet_at(buf, pos, count)?;
        if count == 0 && octet & SIGN != 0 {
            octet &= !SIGN;
            value = 0xffff_ffc0;
        } else {
            value <<= 7;
        }
        count += 1;
        value = value.wrapping_add(u32::from(octet & PAYLOAD));
        if octet & CONTINUATION == 0 {
            break;
        }
    }
    Ok((value.cast_signed(), count))
}

fn decode_64(buf: &[u8], pos: usize, signed: bool) -> Result<(u64, usize), DecodeError> {
    let mut value: u64 = 0;
    let mut count = 0;
    let mut more = true;
    while more && count < VARINT64_GROUPS {
        let mut octet = octet_at(buf, pos, count)?;
        if signed && count == 0 && octet & SIGN != 0 {
            octet &= !SIGN;
            value = 0xffff_ffff_ffff_ffc0;
        } else {
            value <<= 7;
        }
        count += 1;
        value = value.wrapping_add(u64::from(octet & PAYLOAD));
        more = octet & CONTINUATION != 0;
    }
    if more {
        let last = octet_at(buf, pos, count)?;
        count += 1;
        value = (value << 8) | u64::from(last);
    }
    Ok((value, count))
}

/// Decode an unsigned 64-bit VLQ starting at `pos`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends first.
///
/// # Examples
///
/// ```
/// use s7commp::vlq::decode_varuint64;
///
/// let nine = [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xff];
/// assert_eq!(decode_varuint64(&nine, 0).unwrap(), ((1 << 57) | 0xff, 9));
/// ```
pub fn decode_varuint64(buf: &[u8], pos: usize) -> Result<(u64, usize), DecodeError> {
    decode_64(buf, pos, false)
}

/// Decode a signed 64-bit VLQ starting at `pos`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the buffer ends first.
pub fn decode_varint64(buf: &[u8], pos: usize) -> Result<(i64, usize), DecodeError> {
    decode_64(buf, pos, true).map(|(value, count)| (value.cast_signed(), count))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is masked to seven bits before narrowing"
)]
const fn group(value: u64, index: usize) -> u8 { ((value >> (7 * index)) & 0x7f) as u8 }

#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is masked to eight bits before narrowing"
)]
const fn low_byte(value: u64) -> u8 { (value & 0xff) as u8 }

fn push_groups(out: &mut Vec<u8>, value: u64, groups: usize, continue_last: bool) {
    for index in (0..groups).rev() {
        let mut octet = group(value, index);
        if index != 0 || continue_last {
            octet |= CONTINUATION;
        }
        out.push(octet);
    }
}

fn unsigned_groups(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn signed_groups(value: i64, max_groups: usize) -> Option<usize> {
    (1..=max_groups).find(|groups| {
        let bound = 1_i64 << (7 * groups - 1);
        (-bound..bound).contains(&value)
    })
}

/// Encode an unsigned 32-bit VLQ using the fewest octets.
///
/// # Examples
///
/// ```
/// use s7commp::vlq::encode_varuint32;
///
/// assert_eq!(encode_varuint32(1256), vec![0x89, 0x68]);
/// ```
#[must_use]
pub fn encode_varuint32(value: u32) -> Vec<u8> {
    let value = u64::from(value);
    let mut out = Vec::with_capacity(VARINT32_MAX_OCTETS);
    push_groups(&mut out, value, unsigned_groups(value), false);
    out
}

/// Encode a signed 32-bit VLQ using the fewest octets.
#[must_use]
pub fn encode_varint32(value: i32) -> Vec<u8> {
    let value = i64::from(value);
    let groups = signed_groups(value, VARINT32_MAX_OCTETS).unwrap_or(VARINT32_MAX_OCTETS);
    let mut out = Vec::with_capacity(groups);
    push_groups(&mut out, value.cast_unsigned(), groups, false);
    out
}

/// Encode an unsigned 64-bit VLQ.
///
/// Values wider than 56 bits use the nine-octet form whose final octet is
/// a plain byte.
#[must_use]
pub fn encode_varuint64(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(VARINT64_MAX_OCTETS);
    let groups = unsigned_groups(value);
    if groups <= VARINT64_GROUPS {
        push_groups(&mut out, value, groups, false);
    } else {
        push_groups(&mut out, value >> 8, VARINT64_GROUPS, true);
        out.push(low_byte(value));
    }
    out
}

/// Encode a signed 64-bit VLQ.
///
/// Values outside the 56-bit signed range use the nine-octet form.
#[must_use]
pub fn encode_varint64(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(VARINT64_MAX_OCTETS);
    if let Some(groups) = signed_groups(value, VARINT64_GROUPS) {
        push_groups(&mut out, value.cast_unsigned(), groups, false);
    } else {
        push_groups(&mut out, (value >> 8).cast_unsigned(), VARINT64_GROUPS, true);
        out.push(low_byte(value.cast_unsigned()));
    }
    out
}

#[cfg(test)]
mod tests;
