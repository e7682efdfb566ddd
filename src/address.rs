//! Item addresses used by the multi-variable functions.
//!
//! An address is a run of VLQ fields. A non-zero first field is a symbol CRC
//! and the rest describe a memory area plus a chain of LIDs; a zero first
//! field means the remaining fields are plain object and attribute ids.
//! Both forms have the same layout, so the field count is the same
//! either way.

use std::fmt;

use serde::Serialize;

use crate::{cursor::Reader, error::DecodeError};

const AREA_DB: u16 = 0x8a0e;
const AREA_IQMCT: u16 = 0x0000;
const BASE_AREA_IQMCT: u32 = 0x0e98;
const BASE_AREA_DB: u32 = 0x09f6;

/// Memory area named by the area field of a symbolic address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "area", rename_all = "snake_case")]
pub enum MemoryArea {
    DataBlock { number: u16 },
    Inputs,
    Outputs,
    Flags,
    Counters,
    Timers,
    Unknown { high: u16, low: u16 },
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the area is split into its two 16-bit halves"
)]
impl From<u32> for MemoryArea {
    fn from(area: u32) -> Self {
        let high = (area >> 16) as u16;
        let low = area as u16;
        match (high, low) {
            (AREA_DB, number) => Self::DataBlock { number },
            (AREA_IQMCT, 0x50) => Self::Inputs,
            (AREA_IQMCT, 0x51) => Self::Outputs,
            (AREA_IQMCT, 0x52) => Self::Flags,
            (AREA_IQMCT, 0x53) => Self::Counters,
            (AREA_IQMCT, 0x54) => Self::Timers,
            (high, low) => Self::Unknown { high, low },
        }
    }
}

impl fmt::Display for MemoryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataBlock { number } => write!(f, "DB{number}"),
            Self::Inputs => f.write_str("I"),
            Self::Outputs => f.write_str("Q"),
            Self::Flags => f.write_str("M"),
            Self::Counters => f.write_str("C"),
            Self::Timers => f.write_str("T"),
            Self::Unknown { high, low } => write!(f, "Unknown Area 0x{high:04x} / 0x{low:04x}"),
        }
    }
}

/// Second area field of a symbolic address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseArea {
    Iqmct,
    DataBlock,
    Other(u32),
}

impl From<u32> for BaseArea {
    fn from(value: u32) -> Self {
        match value {
            BASE_AREA_IQMCT => Self::Iqmct,
            BASE_AREA_DB => Self::DataBlock,
            other => Self::Other(other),
        }
    }
}

/// Symbol CRC plus LID chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolicAddress {
    pub crc: u32,
    pub area: u32,
    pub memory_area: MemoryArea,
    pub lid_nesting_depth: u32,
    pub base_area: BaseArea,
    /// One LID per nesting level below the first.
    pub lids: Vec<u32>,
}

/// Object and attribute ids, used when the CRC field is zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdAddress {
    pub rid: u32,
    pub id_count: u32,
    pub first_id: u32,
    pub ids: Vec<u32>,
}

/// Either address form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ItemAddress {
    Symbolic(SymbolicAddress),
    ById(IdAddress),
}

impl fmt::Display for ItemAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbolic(address) => {
                write!(f, "SYM-CRC={:08x}, LID={}", address.crc, address.memory_area)?;
                address.lids.iter().try_for_each(|lid| write!(f, ".{lid}"))
            }
            Self::ById(address) => {
                write!(f, "by IDs: RID={}, ID={}", address.rid, address.first_id)?;
                address.ids.iter().try_for_each(|id| write!(f, ", ID={id}"))
            }
        }
    }
}

/// An address with the number of VLQ fields it occupied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedAddress {
    pub address: ItemAddress,
    /// Some requests declare a total field budget that addresses draw from.
    pub number_of_fields: u32,
}

/// Decode one item address.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field runs past the end.
pub fn decode_item_address(reader: &mut Reader<'_, '_>) -> Result<DecodedAddress, DecodeError> {
    let start = reader.position();
    let crc = reader.varuint32()?;
    let area = reader.varuint32()?;
    let depth = reader.varuint32()?;
    let base = reader.varuint32()?;
    let mut chain = Vec::new();
    for _ in 2..=depth {
        chain.push(reader.varuint32()?);
    }
    let number_of_fields = u32::try_from(chain.len()).map_or(u32::MAX, |lids| lids.saturating_add(4));

    let address = if crc == 0 {
        ItemAddress::ById(IdAddress {
            rid: area,
            id_count: depth,
            first_id: base,
            ids: chain,
        })
    } else {
        ItemAddress::Symbolic(SymbolicAddress {
            crc,
            area,
            memory_area: MemoryArea::from(area),
            lid_nesting_depth: depth,
            base_area: BaseArea::from(base),
            lids: chain,
        })
    };
    reader.label(start, &format_args!("Item Address: {address}"));
    Ok(DecodedAddress {
        address,
        number_of_fields,
    })
}
