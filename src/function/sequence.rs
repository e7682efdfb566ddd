//! BeginSequence and EndSequence: bracketing a run of download requests.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{ElementId, ObjectTree, decode_object_tree},
    return_value::{ReturnValue, decode_return_value},
};

/// What follows the fixed part of a begin-sequence request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeginSequenceTail {
    Objects { objects: ObjectTree },
    Unknown { value: u16 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BeginSequenceRequest {
    pub unknown1: u16,
    pub unknown2: u16,
    pub unknown3: u8,
    pub tail: BeginSequenceTail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BeginSequenceResponse {
    pub return_value: ReturnValue,
    pub unknown1: u16,
    pub unknown2: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EndSequenceRequest {
    pub unknown1: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EndSequenceResponse {
    pub return_value: ReturnValue,
}

/// Decode a begin-sequence request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or the tree is
/// malformed.
pub fn decode_begin_request(
    reader: &mut Reader<'_, '_>,
) -> Result<BeginSequenceRequest, DecodeError> {
    let unknown1 = reader.u16()?;
    let unknown2 = reader.u16()?;
    let unknown3 = reader.u8()?;
    let tail = if reader.peek_u8() == Some(ElementId::START_OBJECT) {
        BeginSequenceTail::Objects {
            objects: decode_object_tree(reader)?,
        }
    } else {
        BeginSequenceTail::Unknown {
            value: reader.u16()?,
        }
    };
    Ok(BeginSequenceRequest {
        unknown1,
        unknown2,
        unknown3,
        tail,
    })
}

/// Decode a begin-sequence response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_begin_response(
    reader: &mut Reader<'_, '_>,
) -> Result<BeginSequenceResponse, DecodeError> {
    Ok(BeginSequenceResponse {
        return_value: decode_return_value(reader)?,
        unknown1: reader.u16()?,
        unknown2: reader.u32()?,
    })
}

/// Decode an end-sequence request.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the field is cut off.
pub fn decode_end_request(reader: &mut Reader<'_, '_>) -> Result<EndSequenceRequest, DecodeError> {
    Ok(EndSequenceRequest {
        unknown1: reader.u16()?,
    })
}

/// Decode an end-sequence response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the return value is cut off.
pub fn decode_end_response(
    reader: &mut Reader<'_, '_>,
) -> Result<EndSequenceResponse, DecodeError> {
    Ok(EndSequenceResponse {
        return_value: decode_return_value(reader)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::decode_with;

    #[test]
    fn begin_request_with_object_tree() {
        let bytes = [
            0x00, 0x01, 0x00, 0x02, 0x03,
            ElementId::START_OBJECT, 0, 0, 0, 1, 2, 0, 0, ElementId::TERM_OBJECT,
        ];
        let decoded = decode_with(&bytes, decode_begin_request);
        assert_eq!(decoded.position, bytes.len());
        let request = decoded.expect("begin sequence");
        assert!(matches!(request.tail, BeginSequenceTail::Objects { ref objects } if objects.len() == 1));
    }

    #[test]
    fn begin_request_without_tree_reads_two_bytes() {
        let bytes = [0x00, 0x01, 0x00, 0x02, 0x03, 0xbe, 0xef, 0xff];
        let decoded = decode_with(&bytes, decode_begin_request);
        assert_eq!(decoded.position, 7);
        assert_eq!(decoded.expect("begin sequence").tail, BeginSequenceTail::Unknown {
            value: 0xbeef
        });
    }

    #[test]
    fn begin_response_layout() {
        let bytes = [0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
        let decoded = decode_with(&bytes, decode_begin_response);
        assert_eq!(decoded.position, bytes.len());
        let response = decoded.expect("begin response");
        assert_eq!((response.unknown1, response.unknown2), (1, 2));
    }

    #[test]
    fn end_sequence_pair() {
        assert_eq!(decode_with(&[0x12, 0x34], decode_end_request).expect("end").unknown1, 0x1234);
        assert!(decode_with(&[0x00], decode_end_response)
            .expect("end response")
            .return_value
            .is_success());
    }
}
