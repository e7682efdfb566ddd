//! Object qualifier appended to some requests.
//!
//! The qualifier is an id/value list introduced by the 16-bit id 1256. Its
//! position is not fixed, so the remaining data is scanned for the id; the
//! bytes skipped on the way are kept verbatim.

use bytes::Bytes;
use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{KeyedValueList, Looping, decode_id_value_list},
};

/// Id that opens the qualifier.
pub const OBJECT_QUALIFIER_ID: u16 = 0x04e8;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectQualifier {
    /// Bytes between the function payload and the qualifier id.
    #[serde(skip_serializing_if = "Bytes::is_empty")]
    pub skipped: Bytes,
    /// Offset of the qualifier id.
    pub offset: usize,
    pub members: KeyedValueList,
}

/// Look for an object qualifier in the remaining data.
///
/// Returns `Ok(None)` and leaves the reader untouched when the id does not
/// occur before the last two bytes.
///
/// # Errors
///
/// Returns [`DecodeError`] when the id/value list behind the id is
/// malformed.
pub fn find_object_qualifier(
    reader: &mut Reader<'_, '_>,
) -> Result<Option<ObjectQualifier>, DecodeError> {
    let start = reader.position();
    let Some(offset) = (start..reader.end().saturating_sub(2))
        .find(|&pos| reader.peek_u16_at(pos) == Some(OBJECT_QUALIFIER_ID))
    else {
        log::debug!("no object qualifier after offset {start}");
        return Ok(None);
    };
    let skipped = Bytes::copy_from_slice(reader.bytes(offset - start)?);
    if !skipped.is_empty() {
        reader.label(start, &format_args!("Data: {} byte(s)", skipped.len()));
    }
    reader.skip(2)?;
    reader.label(offset, &format_args!("ID Number: {OBJECT_QUALIFIER_ID}"));
    let members = decode_id_value_list(reader, Looping::UntilTerminator)?;
    reader.label(offset, &"ObjectQualifier");
    Ok(Some(ObjectQualifier {
        skipped,
        offset,
        members,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::decode_with;

    #[test]
    fn skips_to_the_qualifier_id() {
        let bytes = [
            0x11, 0x22, // unknown leftovers
            0x04, 0xe8, // qualifier id
            0x89, 0x0a, 0x00, 0x02, 0x07, // ParentRID: USInt 7
            0x00, // terminator
            0x00, 0x00, 0x00, 0x00,
        ];
        let decoded = decode_with(&bytes, find_object_qualifier);
        assert_eq!(decoded.position, 10);
        let qualifier = decoded.expect("qualifier").expect("present");
        assert_eq!(qualifier.offset, 2);
        assert_eq!(qualifier.skipped.as_ref(), &[0x11, 0x22]);
        assert!(qualifier.members.get(1162).is_some());
    }

    #[test]
    fn missing_id_leaves_reader_in_place() {
        let bytes = [0x00; 16];
        let decoded = decode_with(&bytes, find_object_qualifier);
        assert_eq!(decoded.position, 0);
        assert!(decoded.expect("scan").is_none());
    }

    #[test]
    fn id_in_the_last_two_bytes_is_not_matched() {
        let bytes = [0x00, 0x00, 0x04, 0xe8];
        let decoded = decode_with(&bytes, find_object_qualifier);
        assert!(decoded.expect("scan").is_none());
    }
}
