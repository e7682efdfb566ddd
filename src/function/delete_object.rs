//! DeleteObject: closing a session or subscription.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    return_value::{ReturnValue, decode_return_value},
};

/// Object ids above this value belong to short-lived objects whose deletion
/// reply carries no integrity id.
pub const INTEGRITY_ID_THRESHOLD: u32 = 0x7000_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteObjectRequest {
    pub object_id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteObjectResponse {
    pub return_value: ReturnValue,
    pub object_id: u32,
}

impl DeleteObjectResponse {
    /// Whether the trailing integrity block omits its id.
    #[must_use]
    pub const fn suppresses_integrity_id(&self) -> bool {
        self.object_id > INTEGRITY_ID_THRESHOLD
    }
}

/// Decode a delete-object request.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the object id is cut off.
pub fn decode_request(reader: &mut Reader<'_, '_>) -> Result<DeleteObjectRequest, DecodeError> {
    let start = reader.position();
    let object_id = reader.u32()?;
    reader.label(start, &format_args!("Delete Object Id: 0x{object_id:08x}"));
    Ok(DeleteObjectRequest { object_id })
}

/// Decode a delete-object response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_response(reader: &mut Reader<'_, '_>) -> Result<DeleteObjectResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let start = reader.position();
    let object_id = reader.u32()?;
    reader.label(start, &format_args!("Deleted Object Id: 0x{object_id:08x}"));
    Ok(DeleteObjectResponse {
        return_value,
        object_id,
    })
}
