//! GetLink: resolving link ids that later requests start from.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    return_value::{ReturnValue, decode_return_value},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GetLinkRequest {
    pub unknown1: u32,
    pub id: u32,
    pub unknown2: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GetLinkResponse {
    pub return_value: ReturnValue,
    pub link_ids: Vec<u32>,
}

/// Decode a get-link request.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_request(reader: &mut Reader<'_, '_>) -> Result<GetLinkRequest, DecodeError> {
    let unknown1 = reader.u32()?;
    let start = reader.position();
    let id = reader.varuint32()?;
    reader.label(start, &format_args!("ID Number: {id}"));
    let unknown2 = reader.u16()?;
    Ok(GetLinkRequest {
        unknown1,
        id,
        unknown2,
    })
}

/// Decode a get-link response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_response(reader: &mut Reader<'_, '_>) -> Result<GetLinkResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let count = reader.u8()?;
    let mut link_ids = Vec::with_capacity(usize::from(count));
    for index in 1..=count {
        let start = reader.position();
        let link_id = reader.u32()?;
        reader.label(start, &format_args!("Link-Id [{index}]: 0x{link_id:08x}"));
        link_ids.push(link_id);
    }
    Ok(GetLinkResponse {
        return_value,
        link_ids,
    })
}
