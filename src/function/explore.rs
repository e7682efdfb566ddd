//! Explore: browsing the object model of a PLC.

use std::fmt;

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{ElementId, KeyedValueList, Looping, ObjectTree, decode_id_value_list, decode_object_tree},
    return_value::{ReturnValue, decode_return_value},
    value::Datatype,
};

/// Class byte of an explore area selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExploreClass {
    /// Class byte zero: the request browses objects rather than an area.
    Objects,
    Iqmct,
    Udt,
    DataBlock,
    FunctionBlock,
    Function,
    OrganizationBlock,
    FunctionBlockType,
    Library,
    Unrecognized(u8),
}

impl ExploreClass {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Objects,
            0x90 => Self::Iqmct,
            0x91 => Self::Udt,
            0x92 => Self::DataBlock,
            0x93 => Self::FunctionBlock,
            0x94 => Self::Function,
            0x95 => Self::OrganizationBlock,
            0x96 => Self::FunctionBlockType,
            0x02 => Self::Library,
            other => Self::Unrecognized(other),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Objects => "Objects",
            Self::Iqmct => "IQMCT",
            Self::Udt => "UDT",
            Self::DataBlock => "DB",
            Self::FunctionBlock => "FB",
            Self::Function => "FC",
            Self::OrganizationBlock => "OB",
            Self::FunctionBlockType => "FBT",
            Self::Library => "LIB",
            Self::Unrecognized(_) => "Unknown",
        }
    }
}

/// 4-byte area selector: class, subclass and a 16-bit section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExploreArea {
    pub raw: u32,
    pub class: ExploreClass,
    pub subclass: u8,
    pub section: u16,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the selector is split into its byte and word fields"
)]
impl From<u32> for ExploreArea {
    fn from(raw: u32) -> Self {
        Self {
            raw,
            class: ExploreClass::from_code((raw >> 24) as u8),
            subclass: (raw >> 16) as u8,
            section: raw as u16,
        }
    }
}

impl fmt::Display for ExploreArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            ExploreClass::Objects => f.write_str("Area:[Objects]"),
            ExploreClass::Iqmct => write!(f, "Area:[IQMCT {}]", self.subclass),
            ExploreClass::Library => write!(f, "Area:[LIB {} {}]", self.subclass, self.section),
            ExploreClass::Unrecognized(code) => {
                write!(f, "Area:[0x{code:02x} {}.{}]", self.section, self.subclass)
            }
            class => write!(f, "Area:[{} {}.{}]", class.as_str(), self.section, self.subclass),
        }
    }
}

/// Struct-typed object listed in an explore request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExploreObject {
    pub value: u32,
    pub attributes: KeyedValueList,
    pub sub_ids: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExploreRequest {
    pub area: ExploreArea,
    pub unknown1: u32,
    pub unknown: [u8; 3],
    pub objects: Vec<ExploreObject>,
    /// Datatype of the first object that was not a struct. Objects after it
    /// cannot be located and are not decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsupported_object: Option<Datatype>,
    pub ids: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExploreResponse {
    pub return_value: ReturnValue,
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_id: Option<u32>,
    pub objects: ObjectTree,
}

/// Decode an explore request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or an attribute value is
/// malformed.
pub fn decode_request(reader: &mut Reader<'_, '_>) -> Result<ExploreRequest, DecodeError> {
    let start = reader.position();
    let area = ExploreArea::from(reader.u32()?);
    reader.label(start, &area);
    let unknown1 = reader.varuint32()?;
    let unknown = reader.array::<3>()?;
    let object_count = reader.u8()?;
    let id_count = reader.u8()?;

    let mut objects = Vec::new();
    let mut unsupported_object = None;
    for _ in 0..object_count {
        let start = reader.position();
        let datatype = Datatype::from_code(reader.u8()?);
        if datatype != Datatype::Struct {
            unsupported_object = Some(datatype);
            break;
        }
        let value = reader.u32()?;
        let attributes = decode_id_value_list(reader, Looping::UntilTerminator)?;
        if reader.is_abandoned() {
            objects.push(ExploreObject {
                value,
                attributes,
                sub_ids: Vec::new(),
            });
            break;
        }
        let sub_id_count = reader.u16()?;
        let sub_ids = (0..sub_id_count)
            .map(|_| reader.varuint32())
            .collect::<Result<Vec<_>, _>>()?;
        reader.label(start, &format_args!("Object (Struct) = {value}"));
        objects.push(ExploreObject {
            value,
            attributes,
            sub_ids,
        });
    }

    let ids = if reader.is_abandoned() {
        Vec::new()
    } else {
        (0..id_count)
            .map(|_| reader.varuint32())
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(ExploreRequest {
        area,
        unknown1,
        unknown,
        objects,
        unsupported_object,
        ids,
    })
}

/// Decode an explore response.
///
/// The object tree is only present when the return value signals success
/// and a `StartObject` element follows.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or the tree is
/// malformed.
pub fn decode_response(reader: &mut Reader<'_, '_>) -> Result<ExploreResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let id = reader.u32()?;
    let mut extra_id = None;
    let mut objects = ObjectTree::new();
    if return_value.is_success() {
        if reader.peek_u8().is_some_and(|b| b != ElementId::START_OBJECT) {
            extra_id = Some(reader.varuint32()?);
        }
        if reader.peek_u8() == Some(ElementId::START_OBJECT) {
            objects = decode_object_tree(reader)?;
        }
    }
    Ok(ExploreResponse {
        return_value,
        id,
        extra_id,
        objects,
    })
}
