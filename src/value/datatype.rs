//! Datatype tags and flags that prefix every item value.

use std::fmt;

use serde::Serialize;

/// Datatype tag of an item value.
///
/// Codes outside the recognised set are kept as [`Datatype::Unrecognized`]
/// so callers can still report them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    Null,
    Bool,
    USInt,
    UInt,
    UDInt,
    ULInt,
    SInt,
    Int,
    DInt,
    LInt,
    Byte,
    Word,
    DWord,
    LWord,
    Real,
    LReal,
    Timestamp,
    Timespan,
    Rid,
    Aid,
    Blob,
    WString,
    Variant,
    Struct,
    /// Only meaningful inside tag descriptions; never carries a value.
    S7String,
    Unrecognized(u8),
}

impl Datatype {
    /// Map a wire code onto its datatype.
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::value::Datatype;
    ///
    /// assert_eq!(Datatype::from_code(0x17), Datatype::Struct);
    /// assert_eq!(Datatype::from_code(0x18), Datatype::Unrecognized(0x18));
    /// ```
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Null,
            0x01 => Self::Bool,
            0x02 => Self::USInt,
            0x03 => Self::UInt,
            0x04 => Self::UDInt,
            0x05 => Self::ULInt,
            0x06 => Self::SInt,
            0x07 => Self::Int,
            0x08 => Self::DInt,
            0x09 => Self::LInt,
            0x0a => Self::Byte,
            0x0b => Self::Word,
            0x0c => Self::DWord,
            0x0d => Self::LWord,
            0x0e => Self::Real,
            0x0f => Self::LReal,
            0x10 => Self::Timestamp,
            0x11 => Self::Timespan,
            0x12 => Self::Rid,
            0x13 => Self::Aid,
            0x14 => Self::Blob,
            0x15 => Self::WString,
            0x16 => Self::Variant,
            0x17 => Self::Struct,
            0x19 => Self::S7String,
            other => Self::Unrecognized(other),
        }
    }

    /// Wire code of this datatype.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Null => 0x00,
            Self::Bool => 0x01,
            Self::USInt => 0x02,
            Self::UInt => 0x03,
            Self::UDInt => 0x04,
            Self::ULInt => 0x05,
            Self::SInt => 0x06,
            Self::Int => 0x07,
            Self::DInt => 0x08,
            Self::LInt => 0x09,
            Self::Byte => 0x0a,
            Self::Word => 0x0b,
            Self::DWord => 0x0c,
            Self::LWord => 0x0d,
            Self::Real => 0x0e,
            Self::LReal => 0x0f,
            Self::Timestamp => 0x10,
            Self::Timespan => 0x11,
            Self::Rid => 0x12,
            Self::Aid => 0x13,
            Self::Blob => 0x14,
            Self::WString => 0x15,
            Self::Variant => 0x16,
            Self::Struct => 0x17,
            Self::S7String => 0x19,
            Self::Unrecognized(code) => code,
        }
    }

    /// Upper-case name as shown in engineering tools.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Bool",
            Self::USInt => "USInt",
            Self::UInt => "UInt",
            Self::UDInt => "UDInt",
            Self::ULInt => "ULInt",
            Self::SInt => "SInt",
            Self::Int => "Int",
            Self::DInt => "DInt",
            Self::LInt => "LInt",
            Self::Byte => "Byte",
            Self::Word => "Word",
            Self::DWord => "DWord",
            Self::LWord => "LWord",
            Self::Real => "Real",
            Self::LReal => "LReal",
            Self::Timestamp => "Timestamp",
            Self::Timespan => "Timespan",
            Self::Rid => "RID",
            Self::Aid => "AID",
            Self::Blob => "Blob",
            Self::WString => "WString",
            Self::Variant => "Variant",
            Self::Struct => "Struct",
            Self::S7String => "S7String",
            Self::Unrecognized(_) => "Unknown",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "Unknown datatype: 0x{code:02x}"),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Flag octet preceding the datatype tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatatypeFlags(pub u8);

impl DatatypeFlags {
    pub const ARRAY: u8 = 0x10;
    pub const ADDRESS_ARRAY: u8 = 0x20;
    pub const SPARSE_ARRAY: u8 = 0x40;
    /// Reserved bit seen on the wire with no known meaning.
    pub const UNKNOWN: u8 = 0x80;

    #[must_use]
    pub const fn is_array(self) -> bool { self.0 & Self::ARRAY != 0 }

    #[must_use]
    pub const fn is_address_array(self) -> bool { self.0 & Self::ADDRESS_ARRAY != 0 }

    #[must_use]
    pub const fn is_sparse_array(self) -> bool { self.0 & Self::SPARSE_ARRAY != 0 }

    #[must_use]
    pub const fn is_unknown(self) -> bool { self.0 & Self::UNKNOWN != 0 }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn every_recognised_code_maps_back() {
        for code in 0..=u8::MAX {
            assert_eq!(Datatype::from_code(code).code(), code);
        }
    }

    #[rstest]
    #[case::gap(0x18)]
    #[case::high(0xff)]
    fn unassigned_codes_are_unrecognized(#[case] code: u8) {
        assert_eq!(Datatype::from_code(code), Datatype::Unrecognized(code));
        assert_eq!(
            Datatype::from_code(code).to_string(),
            format!("Unknown datatype: 0x{code:02x}")
        );
    }

    #[test]
    fn flags_decompose() {
        let flags = DatatypeFlags(0x90);
        assert!(flags.is_array());
        assert!(flags.is_unknown());
        assert!(!flags.is_address_array());
        assert!(!flags.is_sparse_array());
    }
}
