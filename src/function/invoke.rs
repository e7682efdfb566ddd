//! Invoke: calling a method on a sub-session.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{KeyedValueList, Looping, decode_itemnumber_value_list},
    return_value::{ReturnValue, decode_return_value},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvokeRequest {
    pub sub_session_id: u32,
    pub unknown1: u32,
    pub items: KeyedValueList,
    /// Missing when the item list was abandoned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown2: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvokeResponse {
    pub return_values: [ReturnValue; 3],
    pub items: KeyedValueList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown: Option<u8>,
}

/// Decode an invoke request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_request(reader: &mut Reader<'_, '_>) -> Result<InvokeRequest, DecodeError> {
    let start = reader.position();
    let sub_session_id = reader.u32()?;
    reader.label(start, &format_args!("Sub Session Id: 0x{sub_session_id:08x}"));
    let unknown1 = reader.u32()?;
    let items = decode_itemnumber_value_list(reader, Looping::UntilTerminator)?;
    Ok(InvokeRequest {
        sub_session_id,
        unknown1,
        items,
        unknown2: trailing_byte(reader)?,
    })
}

/// Decode an invoke response.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_response(reader: &mut Reader<'_, '_>) -> Result<InvokeResponse, DecodeError> {
    let return_values = [
        decode_return_value(reader)?,
        decode_return_value(reader)?,
        decode_return_value(reader)?,
    ];
    let items = decode_itemnumber_value_list(reader, Looping::UntilTerminator)?;
    Ok(InvokeResponse {
        return_values,
        items,
        unknown: trailing_byte(reader)?,
    })
}

fn trailing_byte(reader: &mut Reader<'_, '_>) -> Result<Option<u8>, DecodeError> {
    if reader.is_abandoned() {
        return Ok(None);
    }
    reader.u8().map(Some)
}
