//! Tag descriptions embedded in object trees.
//!
//! A description names one variable of a block interface and says where it
//! lives. The trailing offset info has a layout chosen by the
//! offset-info-type byte that opens the description.

use serde::Serialize;

use super::ElementId;
use crate::{cursor::Reader, error::DecodeError, value::Datatype};

/// 32-bit attribute bitmask of a tag description.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AttributeFlags(pub u32);

impl AttributeFlags {
    pub const HOST_RELEVANT: u32 = 0x0800_0000;
    pub const PLAIN_MEMBER_RETAIN: u32 = 0x0200_0000;
    pub const PLAIN_MEMBER_CLASSIC: u32 = 0x0100_0000;
    pub const HMI_VISIBLE: u32 = 0x0080_0000;
    pub const HMI_READ_ONLY: u32 = 0x0040_0000;
    pub const HMI_CACHED: u32 = 0x0020_0000;
    pub const HMI_ACCESSIBLE: u32 = 0x0010_0000;
    pub const IS_QUALIFIER: u32 = 0x0004_0000;
    pub const NORMAL_ACCESS: u32 = 0x0000_8000;
    pub const NEEDS_LEGITIMIZATION: u32 = 0x0000_4000;
    pub const CHANGEABLE_IN_RUN: u32 = 0x0000_2000;
    pub const SERVER_ONLY: u32 = 0x0000_0800;
    pub const CLIENT_READ_ONLY: u32 = 0x0000_0400;
    pub const SEPARATE_LOAD_MEMORY_FILE_ALLOWED: u32 = 0x0000_0200;
    pub const AS_EVALUATION_REQUIRED: u32 = 0x0000_0100;
    pub const BL: u32 = 0x0000_0040;
    pub const PERSISTENT: u32 = 0x0000_0020;
    pub const CORE: u32 = 0x0000_0010;
    pub const IS_OUT: u32 = 0x0000_0008;
    pub const IS_IN: u32 = 0x0000_0004;
    pub const APP_WRITEABLE: u32 = 0x0000_0002;
    pub const APP_READABLE: u32 = 0x0000_0001;

    /// Whether every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: u32) -> bool { self.0 & flag == flag }
}

/// Accessibility of a described variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Public,
    ReadOnly,
    Internal,
    InternalReadOnly,
    Protected,
    ProtectedReadOnly,
    Constant,
    ConstantReadOnly,
    Unrecognized(u32),
}

impl From<u32> for Accessibility {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Public,
            1 => Self::ReadOnly,
            2 => Self::Internal,
            3 => Self::InternalReadOnly,
            4 => Self::Protected,
            5 => Self::ProtectedReadOnly,
            6 => Self::Constant,
            7 => Self::ConstantReadOnly,
            other => Self::Unrecognized(other),
        }
    }
}

/// Interface section a described variable belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Undefined,
    Input,
    Output,
    InOut,
    Static,
    Dynamic,
    Retval,
    Operand,
    Unrecognized(u32),
}

impl From<u32> for Section {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Undefined,
            1 => Self::Input,
            2 => Self::Output,
            3 => Self::InOut,
            4 => Self::Static,
            5 => Self::Dynamic,
            6 => Self::Retval,
            7 => Self::Operand,
            other => Self::Unrecognized(other),
        }
    }
}

/// VLQ after the LID whose meaning depends on the datatype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DatatypeDetail {
    S7StringLength(u32),
    StructRelationId(u32),
    Other(u32),
}

/// Byte and bit offsets, as a pair of values for two address types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OffsetPair {
    pub type1: u32,
    pub type2: u32,
}

/// Bounds of one array dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ArrayBounds {
    pub lower_bound: i32,
    pub element_count: u32,
}

/// Location information; the variant is chosen by the offset-info type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OffsetInfo {
    LibraryElement {
        offset: OffsetPair,
    },
    BoolInUdt {
        offset: OffsetPair,
        bit_offset: OffsetPair,
    },
    ArrayInStruct {
        offset: OffsetPair,
        bounds: ArrayBounds,
        padding: OffsetPair,
    },
    PlainStatic {
        accessibility: Accessibility,
        section: Section,
        offset: OffsetPair,
    },
    Bool {
        accessibility: Accessibility,
        section: Section,
        offset: OffsetPair,
        bit_offset: OffsetPair,
    },
    Array {
        accessibility: Accessibility,
        section: Section,
        offset: OffsetPair,
        bounds: ArrayBounds,
        padding: OffsetPair,
    },
    MultiDimArray {
        accessibility: Accessibility,
        section: Section,
        offset: OffsetPair,
        padding: OffsetPair,
        dimensions: Vec<ArrayBounds>,
    },
    /// Type not understood; VLQs collected up to `TermTagDescription`.
    Unknown {
        type_code: u8,
        values: Vec<u32>,
    },
}

/// Decoded tag description body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagDescription {
    pub offset_info_type: u8,
    pub name: String,
    pub unknown2: u8,
    pub datatype: Datatype,
    pub soft_datatype: u32,
    pub attribute_flags: AttributeFlags,
    pub lid: u32,
    pub datatype_detail: DatatypeDetail,
    pub offset_info: OffsetInfo,
}

fn offset_pair(reader: &mut Reader<'_, '_>) -> Result<OffsetPair, DecodeError> {
    Ok(OffsetPair {
        type1: reader.varuint32()?,
        type2: reader.varuint32()?,
    })
}

fn array_bounds(reader: &mut Reader<'_, '_>) -> Result<ArrayBounds, DecodeError> {
    Ok(ArrayBounds {
        lower_bound: reader.varint32()?,
        element_count: reader.varuint32()?,
    })
}

fn access_and_section(reader: &mut Reader<'_, '_>) -> Result<(Accessibility, Section), DecodeError> {
    Ok((reader.varuint32()?.into(), reader.varuint32()?.into()))
}

/// Decode a description body; the `StartTagDescription` byte is already
/// consumed.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field runs past the end.
pub fn decode_tag_description(
    reader: &mut Reader<'_, '_>,
) -> Result<TagDescription, DecodeError> {
    let offset_info_type = reader.u8()?;
    let name_len = reader.varuint32()?;
    let name = String::from_utf8_lossy(reader.counted_bytes(name_len)?).into_owned();
    let unknown2 = reader.u8()?;
    let datatype = Datatype::from_code(reader.u8()?);
    let soft_datatype = reader.varuint32()?;
    let attribute_flags = AttributeFlags(reader.u32()?);
    let lid = reader.varuint32()?;
    let detail = reader.varuint32()?;
    let datatype_detail = match datatype {
        Datatype::S7String => DatatypeDetail::S7StringLength(detail),
        Datatype::Struct => DatatypeDetail::StructRelationId(detail),
        _ => DatatypeDetail::Other(detail),
    };
    let offset_info = decode_offset_info(reader, offset_info_type)?;

    Ok(TagDescription {
        offset_info_type,
        name,
        unknown2,
        datatype,
        soft_datatype,
        attribute_flags,
        lid,
        datatype_detail,
        offset_info,
    })
}

fn decode_offset_info(
    reader: &mut Reader<'_, '_>,
    type_code: u8,
) -> Result<OffsetInfo, DecodeError> {
    Ok(match type_code {
        0x00 => OffsetInfo::LibraryElement {
            offset: offset_pair(reader)?,
        },
        0x01 => OffsetInfo::BoolInUdt {
            offset: offset_pair(reader)?,
            bit_offset: offset_pair(reader)?,
        },
        0x02 => OffsetInfo::ArrayInStruct {
            offset: offset_pair(reader)?,
            bounds: array_bounds(reader)?,
            padding: offset_pair(reader)?,
        },
        0x04 => {
            let (accessibility, section) = access_and_section(reader)?;
            OffsetInfo::PlainStatic {
                accessibility,
                section,
                offset: offset_pair(reader)?,
            }
        }
        0x05 => {
            let (accessibility, section) = access_and_section(reader)?;
            OffsetInfo::Bool {
                accessibility,
                section,
                offset: offset_pair(reader)?,
                bit_offset: offset_pair(reader)?,
            }
        }
        0x06 => {
            let (accessibility, section) = access_and_section(reader)?;
            OffsetInfo::Array {
                accessibility,
                section,
                offset: offset_pair(reader)?,
                bounds: array_bounds(reader)?,
                padding: offset_pair(reader)?,
            }
        }
        0x07 => {
            let (accessibility, section) = access_and_section(reader)?;
            let offset = offset_pair(reader)?;
            let padding = offset_pair(reader)?;
            let count = reader.varuint32()?;
            let mut dimensions = Vec::new();
            for _ in 0..count {
                dimensions.push(array_bounds(reader)?);
            }
            OffsetInfo::MultiDimArray {
                accessibility,
                section,
                offset,
                padding,
                dimensions,
            }
        }
        other => {
            let mut values = Vec::new();
            for _ in 0..reader.remaining() {
                match reader.peek_u8() {
                    Some(ElementId::TERM_TAG_DESCRIPTION) | None => break,
                    Some(_) => values.push(reader.varuint32()?),
                }
            }
            OffsetInfo::Unknown {
                type_code: other,
                values,
            }
        }
    })
}
