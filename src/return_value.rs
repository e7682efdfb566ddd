//! Return values carried by responses.
//!
//! A return value is a 64-bit VLQ packing an error code with several
//! diagnostic fields. [`ReturnValue`] keeps the raw quantity and exposes the
//! decomposed fields.

use std::fmt;

use serde::Serialize;

use crate::{cursor::Reader, error::DecodeError};

const SERVER_ERROR: u64 = 0x0000_8000_0000_0000;
const ERROR_EXTENSION: u64 = 0x4000_0000_0000_0000;
const GENERIC_ERROR_MASK: u8 = 0xef;
const DEBUG_INFO_MASK: u16 = 0x3fff;

/// Decomposed 64-bit return value.
///
/// # Examples
///
/// ```
/// use s7commp::return_value::ReturnValue;
///
/// let ok = ReturnValue::from_raw(0);
/// assert!(ok.is_success());
/// assert_eq!(ok.oms_line, 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnValue {
    pub raw: u64,
    /// Low 16 bits, signed; zero means success.
    pub error_code: i16,
    pub oms_line: u16,
    pub error_source: u8,
    pub generic_error: u8,
    pub server_error: bool,
    pub debug_info: u16,
    pub error_extension: bool,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "each field is a deliberate narrowing of one bit range"
)]
impl ReturnValue {
    /// Split `raw` into its fields.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self {
            raw,
            error_code: (raw as u16).cast_signed(),
            oms_line: (raw >> 16) as u16,
            error_source: (raw >> 32) as u8,
            generic_error: ((raw >> 40) as u8) & GENERIC_ERROR_MASK,
            server_error: raw & SERVER_ERROR != 0,
            debug_info: ((raw >> 48) as u16) & DEBUG_INFO_MASK,
            error_extension: raw & ERROR_EXTENSION != 0,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool { self.error_code == 0 }
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Return value: 0x{:x} - Error code: {}", self.raw, self.error_code)
    }
}

/// Read a return value.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when the VLQ is cut off.
pub fn decode_return_value(reader: &mut Reader<'_, '_>) -> Result<ReturnValue, DecodeError> {
    let start = reader.position();
    let value = ReturnValue::from_raw(reader.varuint64()?);
    reader.label(start, &value);
    Ok(value)
}
