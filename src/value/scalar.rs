//! Single decoded payload element.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use super::Timestamp;

/// One payload element, typed by the datatype tag that preceded it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Scalar {
    Null,
    Bool(u8),
    USInt(u8),
    UInt(u16),
    UDInt(u32),
    ULInt(u64),
    SInt(i8),
    Int(i16),
    DInt(i32),
    LInt(i64),
    Byte(u8),
    Word(u16),
    DWord(u32),
    LWord(u64),
    Real(f32),
    LReal(f64),
    Timestamp(Timestamp),
    /// Nanoseconds.
    Timespan(u64),
    Rid(u32),
    Aid(u32),
    Blob {
        /// Octet preceding the length, meaning unknown.
        reserved: u8,
        data: Bytes,
    },
    WString(String),
    Variant(u32),
    /// Relation id of a struct whose members follow as an id/value list.
    Struct(u32),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("<NO VALUE>"),
            Self::Bool(v) | Self::Byte(v) => write!(f, "0x{v:02x}"),
            Self::USInt(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::UDInt(v) | Self::Aid(v) | Self::Variant(v) | Self::Struct(v) => write!(f, "{v}"),
            Self::ULInt(v) => write!(f, "{v}"),
            Self::SInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::DInt(v) => write!(f, "{v}"),
            Self::LInt(v) => write!(f, "{v}"),
            Self::Word(v) => write!(f, "0x{v:04x}"),
            Self::DWord(v) | Self::Rid(v) => write!(f, "0x{v:08x}"),
            Self::LWord(v) => write!(f, "0x{v:016x}"),
            Self::Real(v) => write!(f, "{v:.6}"),
            Self::LReal(v) => write!(f, "{v:.6}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Timespan(ns) => write!(f, "{ns} ns"),
            Self::Blob { data, .. } => data.iter().try_for_each(|b| write!(f, "{b:02x}")),
            Self::WString(s) => f.write_str(s),
        }
    }
}
