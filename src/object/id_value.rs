//! Zero-terminated lists of keyed values.
//!
//! Three list shapes share one layout: a VLQ key where zero ends the list,
//! followed by an entry. Id/value and item-number lists carry item values
//! (struct values pull in a nested id/value list for their members); error
//! lists carry return values.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    return_value::{ReturnValue, decode_return_value},
    value::{ValueNode, decode_value},
};

/// Whether a list decoder reads one entry or runs to the terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Looping {
    /// Read a single key and, when non-zero, its value.
    Single,
    /// Read entries until a zero key.
    UntilTerminator,
}

/// One keyed entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeyedValue {
    /// Attribute id or item number, depending on the list.
    pub key: u32,
    pub value: ValueNode,
    /// Members of a struct value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<KeyedValueList>,
}

/// Decoded list of keyed values.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KeyedValueList {
    pub items: Vec<KeyedValue>,
    /// The zero key was read.
    pub terminated: bool,
}

impl KeyedValueList {
    #[must_use]
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    #[must_use]
    pub fn len(&self) -> usize { self.items.len() }

    /// Look up an entry by key, ignoring struct members.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&KeyedValue> {
        self.items.iter().find(|item| item.key == key)
    }
}

#[derive(Clone, Copy)]
enum KeyKind {
    Id,
    ItemNumber,
}

impl KeyKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::ItemNumber => "Item",
        }
    }
}

/// Decode a list of attribute ids and values.
///
/// An entry that fails to decode abandons the scope: the reader rewinds to
/// the entry's key, the failure becomes an anomaly and the entries read so
/// far come back with `terminated` unset.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] only when the loop bound is exhausted
/// without reaching the end of the list.
pub fn decode_id_value_list(
    reader: &mut Reader<'_, '_>,
    looping: Looping,
) -> Result<KeyedValueList, DecodeError> {
    decode_keyed(reader, looping, KeyKind::Id)
}

/// Decode a list of item numbers and values; struct members use ids.
///
/// Recovers from a bad entry the way [`decode_id_value_list`] does.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] only when the loop bound is exhausted
/// without reaching the end of the list.
pub fn decode_itemnumber_value_list(
    reader: &mut Reader<'_, '_>,
    looping: Looping,
) -> Result<KeyedValueList, DecodeError> {
    decode_keyed(reader, looping, KeyKind::ItemNumber)
}

fn decode_keyed(
    reader: &mut Reader<'_, '_>,
    looping: Looping,
    kind: KeyKind,
) -> Result<KeyedValueList, DecodeError> {
    let mut list = KeyedValueList::default();
    // Every entry consumes at least its key byte.
    for _ in 0..=reader.remaining() {
        let start = reader.position();
        match decode_keyed_entry(reader, kind, start) {
            Ok(Some(item)) => list.items.push(item),
            Ok(None) => {
                list.terminated = true;
                return Ok(list);
            }
            Err(error) => {
                reader.abandon(start, &error);
                return Ok(list);
            }
        }
        if looping == Looping::Single || reader.is_abandoned() {
            return Ok(list);
        }
    }
    Err(DecodeError::Truncated {
        offset: reader.position(),
        needed: 1,
        available: reader.remaining(),
    })
}

/// One key and its value; `None` for the terminating zero key.
fn decode_keyed_entry(
    reader: &mut Reader<'_, '_>,
    kind: KeyKind,
    start: usize,
) -> Result<Option<KeyedValue>, DecodeError> {
    let key = reader.varuint32()?;
    if key == 0 {
        reader.label(start, &"Terminating Item/List");
        return Ok(None);
    }
    let decoded = decode_value(reader)?;
    let members = if decoded.entered_struct {
        Some(reader.nested(|r| decode_id_value_list(r, Looping::UntilTerminator))?)
    } else {
        None
    };
    reader.label(start, &format_args!("{} [{key}]: {}", kind.name(), decoded.node));
    Ok(Some(KeyedValue {
        key,
        value: decoded.node,
        members,
    }))
}

/// Per-item error of a multi-variable response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub item_number: u32,
    pub return_value: ReturnValue,
}

/// Decode item-number/return-value pairs up to the zero item number.
///
/// A pair that fails to decode abandons the scope, keeping the pairs read
/// before it.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] only when the loop bound is exhausted
/// without reaching the end of the list.
pub fn decode_error_value_list(
    reader: &mut Reader<'_, '_>,
) -> Result<Vec<ItemError>, DecodeError> {
    let mut errors = Vec::new();
    for _ in 0..=reader.remaining() {
        let start = reader.position();
        match decode_error_entry(reader, start) {
            Ok(Some(error)) => errors.push(error),
            Ok(None) => return Ok(errors),
            Err(error) => {
                reader.abandon(start, &error);
                return Ok(errors);
            }
        }
    }
    Err(DecodeError::Truncated {
        offset: reader.position(),
        needed: 1,
        available: reader.remaining(),
    })
}

fn decode_error_entry(
    reader: &mut Reader<'_, '_>,
    start: usize,
) -> Result<Option<ItemError>, DecodeError> {
    let item_number = reader.varuint32()?;
    if item_number == 0 {
        reader.label(start, &"Terminating ErrorValueList");
        return Ok(None);
    }
    let return_value = decode_return_value(reader)?;
    reader.label(
        start,
        &format_args!("Item [{item_number}]: Error code: {}", return_value.error_code),
    );
    Ok(Some(ItemError {
        item_number,
        return_value,
    }))
}
