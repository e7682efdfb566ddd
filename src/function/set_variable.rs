//! SetVariable: writing attributes of one object.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{KeyedValueList, Looping, decode_id_value_list},
    return_value::{ReturnValue, decode_return_value},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SetVariableRequest {
    pub object_id: u32,
    /// One single-entry list per declared item.
    pub items: Vec<KeyedValueList>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SetVariableResponse {
    pub return_value: ReturnValue,
}

/// Decode a set-variable request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_request(reader: &mut Reader<'_, '_>) -> Result<SetVariableRequest, DecodeError> {
    let start = reader.position();
    let object_id = reader.u32()?;
    reader.label(start, &format_args!("In Object Id: 0x{object_id:08x}"));
    let count = reader.varuint32()?;
    let mut items = Vec::new();
    for _ in 0..count {
        items.push(decode_id_value_list(reader, Looping::Single)?);
        if reader.is_abandoned() {
            break;
        }
    }
    Ok(SetVariableRequest { object_id, items })
}

/// Decode a set-variable response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the return value is cut off.
pub fn decode_response(reader: &mut Reader<'_, '_>) -> Result<SetVariableResponse, DecodeError> {
    Ok(SetVariableResponse {
        return_value: decode_return_value(reader)?,
    })
}
