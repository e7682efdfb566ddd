//! GetMultiVariables and SetMultiVariables: bulk reads and writes.
//!
//! Both requests open with a 4-byte field. Zero means the items are given by
//! full item addresses; anything else is a link or object id and the items
//! are plain VLQ ids.

use serde::Serialize;

use crate::{
    address::{DecodedAddress, decode_item_address},
    cursor::Reader,
    error::DecodeError,
    object::{ItemError, KeyedValueList, Looping, decode_error_value_list, decode_itemnumber_value_list},
    return_value::{ReturnValue, decode_return_value},
};

/// How the items of a multi-variable request are addressed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ItemAddressing {
    /// Full item addresses drawing on a declared field budget.
    Addresses {
        field_count: u32,
        addresses: Vec<DecodedAddress>,
        /// Declared fields not used by the addresses; zero when the two
        /// agree.
        unused_fields: i64,
    },
    /// Plain ids relative to a link or object id.
    Ids { ids: Vec<u32> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GetMultiVariablesRequest {
    /// Zero for address lists, otherwise the link id.
    pub link_id: u32,
    pub item_count: u32,
    pub items: ItemAddressing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GetMultiVariablesResponse {
    pub return_value: ReturnValue,
    pub values: KeyedValueList,
    pub errors: Vec<ItemError>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SetMultiVariablesRequest {
    /// Zero for address lists, otherwise the object id being written.
    pub object_id: u32,
    pub item_count: u32,
    pub items: ItemAddressing,
    /// One single-entry list per item.
    pub values: Vec<KeyedValueList>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetMultiVariablesResponse {
    pub return_value: ReturnValue,
    pub errors: Vec<ItemError>,
}

fn decode_addresses(
    reader: &mut Reader<'_, '_>,
    item_count: u32,
) -> Result<ItemAddressing, DecodeError> {
    let field_count = reader.varuint32()?;
    let mut unused_fields = i64::from(field_count);
    let mut addresses = Vec::new();
    for _ in 0..item_count {
        let address = decode_item_address(reader)?;
        unused_fields -= i64::from(address.number_of_fields);
        addresses.push(address);
    }
    if unused_fields != 0 {
        log::debug!("item addresses leave {unused_fields} of {field_count} declared field(s)");
    }
    Ok(ItemAddressing::Addresses {
        field_count,
        addresses,
        unused_fields,
    })
}

fn decode_ids(reader: &mut Reader<'_, '_>) -> Result<ItemAddressing, DecodeError> {
    let count = reader.varuint32()?;
    let mut ids = Vec::new();
    for _ in 0..count {
        let start = reader.position();
        let id = reader.varuint32()?;
        reader.label(start, &format_args!("ID Number: {id}"));
        ids.push(id);
    }
    Ok(ItemAddressing::Ids { ids })
}

/// Decode a get-multi-variables request.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_get_request(
    reader: &mut Reader<'_, '_>,
) -> Result<GetMultiVariablesRequest, DecodeError> {
    let start = reader.position();
    let link_id = reader.u32()?;
    if link_id == 0 {
        reader.label(start, &"Unknown: 0x00000000");
    } else {
        reader.label(start, &format_args!("Link-Id: 0x{link_id:08x}"));
    }
    let item_count = reader.varuint32()?;
    let items = if link_id == 0 {
        decode_addresses(reader, item_count)?
    } else {
        decode_ids(reader)?
    };
    Ok(GetMultiVariablesRequest {
        link_id,
        item_count,
        items,
    })
}

/// Decode a get-multi-variables response.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_get_response(
    reader: &mut Reader<'_, '_>,
) -> Result<GetMultiVariablesResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let values = decode_itemnumber_value_list(reader, Looping::UntilTerminator)?;
    let errors = if reader.is_abandoned() {
        Vec::new()
    } else {
        decode_error_value_list(reader)?
    };
    Ok(GetMultiVariablesResponse {
        return_value,
        values,
        errors,
    })
}

/// Decode a set-multi-variables request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_set_request(
    reader: &mut Reader<'_, '_>,
) -> Result<SetMultiVariablesRequest, DecodeError> {
    let start = reader.position();
    let object_id = reader.u32()?;
    if object_id != 0 {
        reader.label(start, &format_args!("Set Variables in Object Id : 0x{object_id:08x}"));
    }
    let item_count = reader.varuint32()?;
    let items = if object_id == 0 {
        decode_addresses(reader, item_count)?
    } else {
        decode_ids(reader)?
    };
    let mut values = Vec::new();
    for _ in 0..item_count {
        values.push(decode_itemnumber_value_list(reader, Looping::Single)?);
        if reader.is_abandoned() {
            break;
        }
    }
    Ok(SetMultiVariablesRequest {
        object_id,
        item_count,
        items,
        values,
    })
}

/// Decode a set-multi-variables response.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_set_response(
    reader: &mut Reader<'_, '_>,
) -> Result<SetMultiVariablesResponse, DecodeError> {
    Ok(SetMultiVariablesResponse {
        return_value: decode_return_value(reader)?,
        errors: decode_error_value_list(reader)?,
    })
}
