//! Integrity blocks: an optional VLQ id, a digest length and the digest.
//!
//! The digest is carried, never verified.

use bytes::Bytes;
use serde::Serialize;

use crate::{
    cursor::Reader,
    error::{Anomaly, DecodeError},
};

/// Digest length every well-formed integrity block declares.
pub const DIGEST_LEN: u8 = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntegrityBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub digest_length: u8,
    /// `None` when the declared length was not [`DIGEST_LEN`].
    pub digest: Option<Bytes>,
}

/// What follows the function payload at the end of the data region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrailingIntegrity {
    /// Firmware 1.5 and later: only the id remains at the end.
    Id { id: u32 },
    Block(IntegrityBlock),
}

/// Decode an integrity block, reading a leading id when `with_id` is set.
///
/// A digest length other than [`DIGEST_LEN`] is recorded as
/// [`Anomaly::IntegrityLengthMismatch`]; decoding continues right behind
/// the length byte.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the id, the length or a
/// 32-byte digest is cut off.
pub fn decode_integrity_block(
    reader: &mut Reader<'_, '_>,
    with_id: bool,
) -> Result<IntegrityBlock, DecodeError> {
    let block_start = reader.position();
    let id = if with_id {
        let start = reader.position();
        let id = reader.varuint32()?;
        reader.label(start, &format_args!("Integrity Id: {id}"));
        Some(id)
    } else {
        None
    };
    let length_offset = reader.position();
    let digest_length = reader.u8()?;
    reader.label(length_offset, &format_args!("Digest Length: {digest_length}"));
    let digest = if digest_length == DIGEST_LEN {
        let start = reader.position();
        let digest = Bytes::copy_from_slice(reader.bytes(usize::from(DIGEST_LEN))?);
        reader.label(start, &"Packet Digest");
        Some(digest)
    } else {
        log::warn!("integrity digest length {digest_length} at offset {length_offset}, expected 32");
        reader.record(Anomaly::IntegrityLengthMismatch {
            offset: length_offset,
            declared: digest_length,
        });
        None
    };
    reader.label(block_start, &"Integrity part");
    Ok(IntegrityBlock {
        id,
        digest_length,
        digest,
    })
}
