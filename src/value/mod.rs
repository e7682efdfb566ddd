//! Typed item values.
//!
//! A value starts with a [`DatatypeFlags`] octet and a [`Datatype`] tag. Plain
//! values carry one payload element; arrays and address arrays carry a VLQ
//! element count first; sparse arrays carry `key, element` pairs until a zero
//! key. The datatype alone decides how each element is encoded.
//!
//! A `Struct` element only holds a relation id. Its members follow as an
//! id/value list, which is the caller's job: [`DecodedValue::entered_struct`]
//! tells it to decode one.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::{cursor::Reader, error::DecodeError};

mod datatype;
mod scalar;
mod timestamp;

pub use datatype::{Datatype, DatatypeFlags};
pub use scalar::Scalar;
pub use timestamp::Timestamp;

const MAX_DISPLAYED_ELEMENTS: usize = 10;

/// One entry of a sparse array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SparseEntry {
    /// Non-zero key; for `Variant` arrays this is a type id.
    pub key: u32,
    pub value: Scalar,
}

/// Layout of the payload elements.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ValueShape {
    Single {
        value: Scalar,
    },
    /// `Null` arrays declare a count but carry no element bytes, so
    /// `elements` stays empty for them.
    Array {
        declared: u32,
        elements: Vec<Scalar>,
    },
    AddressArray {
        declared: u32,
        elements: Vec<Scalar>,
    },
    SparseArray {
        entries: Vec<SparseEntry>,
    },
}

impl ValueShape {
    /// Number of elements actually decoded.
    #[must_use]
    pub fn decoded_len(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Array { elements, .. } | Self::AddressArray { elements, .. } => elements.len(),
            Self::SparseArray { entries } => entries.len(),
        }
    }
}

/// A fully decoded item value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValueNode {
    pub flags: DatatypeFlags,
    pub datatype: Datatype,
    #[serde(flatten)]
    pub shape: ValueShape,
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) ", self.datatype)?;
        match &self.shape {
            ValueShape::Single { value } => write!(f, "= {value}"),
            ValueShape::Array { declared, elements } => {
                write!(f, "Array[{declared}] = ")?;
                write_elements(f, elements.iter().map(|e| e as &dyn fmt::Display))
            }
            ValueShape::AddressArray { declared, elements } => {
                write!(f, "Addressarray[{declared}] = ")?;
                write_elements(f, elements.iter().map(|e| e as &dyn fmt::Display))
            }
            ValueShape::SparseArray { entries } => {
                f.write_str("Sparsearray = ")?;
                let pairs: Vec<_> = entries
                    .iter()
                    .map(|entry| format!("{}: {}", entry.key, entry.value))
                    .collect();
                write_elements(f, pairs.iter().map(|p| p as &dyn fmt::Display))
            }
        }
    }
}

fn write_elements<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a dyn fmt::Display>,
) -> fmt::Result {
    for (index, item) in items.enumerate() {
        if index == MAX_DISPLAYED_ELEMENTS {
            return f.write_str(", ...");
        }
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Result of [`decode_value`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedValue {
    pub node: ValueNode,
    /// A `Struct` element was decoded; an id/value list with its members
    /// follows.
    pub entered_struct: bool,
}

/// Decode one item value at the reader's position.
///
/// # Errors
///
/// Returns [`DecodeError::UnknownDatatype`] when the tag is outside the value
/// datatypes, pointing at the tag byte, and [`DecodeError::Truncated`] when
/// the value runs past the readable end. On error the reader is back at the
/// flags byte.
pub fn decode_value(reader: &mut Reader<'_, '_>) -> Result<DecodedValue, DecodeError> {
    let start = reader.position();
    decode_value_at(reader, start).inspect_err(|_| reader.seek(start))
}

fn decode_value_at(
    reader: &mut Reader<'_, '_>,
    start: usize,
) -> Result<DecodedValue, DecodeError> {
    let flags = DatatypeFlags(reader.u8()?);
    let tag_offset = reader.position();
    let datatype = Datatype::from_code(reader.u8()?);

    let shape = if flags.is_sparse_array() {
        ValueShape::SparseArray {
            entries: decode_sparse(reader, datatype, tag_offset)?,
        }
    } else if flags.is_array() || flags.is_address_array() {
        let declared = reader.varuint32()?;
        let elements = decode_elements(reader, datatype, tag_offset, declared)?;
        if flags.is_array() {
            ValueShape::Array { declared, elements }
        } else {
            ValueShape::AddressArray { declared, elements }
        }
    } else {
        ValueShape::Single {
            value: decode_scalar(reader, datatype, tag_offset)?,
        }
    };

    let entered_struct = datatype == Datatype::Struct && shape.decoded_len() > 0;
    let node = ValueNode {
        flags,
        datatype,
        shape,
    };
    reader.label(start, &format_args!("Value {node}"));
    Ok(DecodedValue {
        node,
        entered_struct,
    })
}

fn decode_elements(
    reader: &mut Reader<'_, '_>,
    datatype: Datatype,
    tag_offset: usize,
    declared: u32,
) -> Result<Vec<Scalar>, DecodeError> {
    if datatype == Datatype::Null {
        return Ok(Vec::new());
    }
    let declared = usize::try_from(declared).unwrap_or(usize::MAX);
    // Every other datatype occupies at least one byte per element.
    let mut elements = Vec::with_capacity(declared.min(reader.remaining()));
    for _ in 0..declared {
        elements.push(decode_scalar(reader, datatype, tag_offset)?);
    }
    Ok(elements)
}

fn decode_sparse(
    reader: &mut Reader<'_, '_>,
    datatype: Datatype,
    tag_offset: usize,
) -> Result<Vec<SparseEntry>, DecodeError> {
    let mut entries = Vec::new();
    // Each key takes at least one byte, so the terminator is due before this.
    for _ in 0..=reader.remaining() {
        let key = reader.varuint32()?;
        if key == 0 {
            return Ok(entries);
        }
        let value = decode_scalar(reader, datatype, tag_offset)?;
        entries.push(SparseEntry { key, value });
    }
    Err(DecodeError::Truncated {
        offset: reader.position(),
        needed: 1,
        available: reader.remaining(),
    })
}

fn decode_scalar(
    reader: &mut Reader<'_, '_>,
    datatype: Datatype,
    tag_offset: usize,
) -> Result<Scalar, DecodeError> {
    Ok(match datatype {
        Datatype::Null => Scalar::Null,
        Datatype::Bool => Scalar::Bool(reader.u8()?),
        Datatype::USInt => Scalar::USInt(reader.u8()?),
        Datatype::UInt => Scalar::UInt(reader.u16()?),
        Datatype::UDInt => Scalar::UDInt(reader.varuint32()?),
        Datatype::ULInt => Scalar::ULInt(reader.varuint64()?),
        Datatype::SInt => Scalar::SInt(reader.i8()?),
        Datatype::Int => Scalar::Int(reader.i16()?),
        Datatype::DInt => Scalar::DInt(reader.varint32()?),
        Datatype::LInt => Scalar::LInt(reader.varint64()?),
        Datatype::Byte => Scalar::Byte(reader.u8()?),
        Datatype::Word => Scalar::Word(reader.u16()?),
        Datatype::DWord => Scalar::DWord(reader.u32()?),
        Datatype::LWord => Scalar::LWord(reader.u64()?),
        Datatype::Real => Scalar::Real(reader.f32()?),
        Datatype::LReal => Scalar::LReal(reader.f64()?),
        Datatype::Timestamp => Scalar::Timestamp(Timestamp(reader.u64()?)),
        Datatype::Timespan => Scalar::Timespan(reader.varuint64()?),
        Datatype::Rid => Scalar::Rid(reader.u32()?),
        Datatype::Aid => Scalar::Aid(reader.varuint32()?),
        Datatype::Variant => Scalar::Variant(reader.varuint32()?),
        Datatype::Struct => Scalar::Struct(reader.u32()?),
        Datatype::WString => {
            let len = reader.varuint32()?;
            let text = reader.counted_bytes(len)?;
            Scalar::WString(String::from_utf8_lossy(text).into_owned())
        }
        Datatype::Blob => {
            let reserved = reader.u8()?;
            let len = reader.varuint32()?;
            Scalar::Blob {
                reserved,
                data: Bytes::copy_from_slice(reader.counted_bytes(len)?),
            }
        }
        Datatype::S7String | Datatype::Unrecognized(_) => {
            return Err(DecodeError::UnknownDatatype {
                code: datatype.code(),
                offset: tag_offset,
            });
        }
    })
}
