//! GetVarSubStreamed: reading a variable by a path of 4-byte ids.
//!
//! Request ids are fixed-width rather than VLQ. A struct value opens a level
//! of member ids that a zero id closes.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{KeyedValueList, Looping, decode_id_value_list},
    return_value::{ReturnValue, decode_return_value},
    value::{ValueNode, decode_value},
};

/// One id and its value; struct values carry their members.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamedItem {
    pub id: u32,
    pub value: ValueNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<StreamedItem>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GetVarSubStreamedRequest {
    /// `None` when the request opens with a zero id.
    pub item: Option<StreamedItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GetVarSubStreamedResponse {
    pub return_value: ReturnValue,
    pub unknown: u8,
    pub value: ValueNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<KeyedValueList>,
}

/// Read one id; zero yields `None`.
fn decode_item(reader: &mut Reader<'_, '_>) -> Result<Option<StreamedItem>, DecodeError> {
    let start = reader.position();
    let id = reader.u32()?;
    if id == 0 {
        reader.label(start, &"Terminating Struct");
        return Ok(None);
    }
    let decoded = decode_value(reader)?;
    let members = if decoded.entered_struct {
        Some(reader.nested(decode_members)?)
    } else {
        None
    };
    reader.label(start, &format_args!("Item Value [{id}]: {}", decoded.node));
    Ok(Some(StreamedItem {
        id,
        value: decoded.node,
        members,
    }))
}

fn decode_members(reader: &mut Reader<'_, '_>) -> Result<Vec<StreamedItem>, DecodeError> {
    let mut members = Vec::new();
    // Every id is four bytes.
    for _ in 0..=reader.remaining() {
        match decode_item(reader)? {
            Some(item) => members.push(item),
            None => return Ok(members),
        }
    }
    Err(DecodeError::Truncated {
        offset: reader.position(),
        needed: 4,
        available: reader.remaining(),
    })
}

/// Decode a get-var-sub-streamed request.
///
/// # Errors
///
/// Returns [`DecodeError`] when an id is truncated, a value is malformed or
/// struct nesting passes the configured depth.
pub fn decode_request(
    reader: &mut Reader<'_, '_>,
) -> Result<GetVarSubStreamedRequest, DecodeError> {
    Ok(GetVarSubStreamedRequest {
        item: decode_item(reader)?,
    })
}

/// Decode a get-var-sub-streamed response.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_response(
    reader: &mut Reader<'_, '_>,
) -> Result<GetVarSubStreamedResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let unknown = reader.u8()?;
    let decoded = decode_value(reader)?;
    let members = if decoded.entered_struct {
        Some(reader.nested(|r| decode_id_value_list(r, Looping::UntilTerminator))?)
    } else {
        None
    };
    Ok(GetVarSubStreamedResponse {
        return_value,
        unknown,
        value: decoded.node,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_helpers::decode_with,
        value::{Datatype, Scalar, ValueShape},
    };

    #[test]
    fn plain_value_ends_the_request() {
        let mut bytes = 0x0000_0a01_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0x00, 0x02, 0x09, 0xff]);
        let decoded = decode_with(&bytes, decode_request);
        assert_eq!(decoded.position, 7);
        let item = decoded.expect("request").item.expect("item");
        assert_eq!(item.id, 0x0a01);
        assert!(item.members.is_none());
    }

    #[test]
    fn struct_opens_a_level_closed_by_zero_id() {
        let mut bytes = 1_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0x00, 0x17, 0, 0, 0, 9]);
        bytes.extend_from_slice(&2_u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x02, 0x05]);
        bytes.extend_from_slice(&0_u32.to_be_bytes());
        let decoded = decode_with(&bytes, decode_request);
        assert_eq!(decoded.position, bytes.len());
        let item = decoded.expect("request").item.expect("item");
        assert_eq!(item.value.datatype, Datatype::Struct);
        let members = item.members.expect("members");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].value.shape, ValueShape::Single {
            value: Scalar::USInt(5)
        });
    }

    #[test]
    fn leading_zero_id_is_an_empty_request() {
        let decoded = decode_with(&[0, 0, 0, 0], decode_request);
        assert_eq!(decoded.position, 4);
        assert!(decoded.expect("request").item.is_none());
    }

    #[test]
    fn response_struct_reads_member_list() {
        let bytes = [
            0x00, 0x01, 0x00, 0x17, 0, 0, 0, 3, // return value, unknown, struct
            0x04, 0x00, 0x01, 0x01, 0x00, // member id 4: Bool true, terminator
        ];
        let decoded = decode_with(&bytes, decode_response);
        assert_eq!(decoded.position, bytes.len());
        let response = decoded.expect("response");
        assert_eq!(response.members.map(|m| m.len()), Some(1));
    }
}
