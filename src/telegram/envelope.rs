//! Opcode and the fixed fields in front of every function payload.

use std::fmt;

use serde::Serialize;

use crate::{cursor::Reader, error::DecodeError, function::FunctionCode};

/// First byte of the data region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    Request,
    Response,
    /// Response variant seen with cyclic HMI data.
    Response2,
    Notification,
    Unrecognized(u8),
}

impl Opcode {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x31 => Self::Request,
            0x32 => Self::Response,
            0x02 => Self::Response2,
            0x33 => Self::Notification,
            other => Self::Unrecognized(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Request => 0x31,
            Self::Response => 0x32,
            Self::Response2 => 0x02,
            Self::Notification => 0x33,
            Self::Unrecognized(code) => code,
        }
    }

    #[must_use]
    pub const fn is_response(self) -> bool { matches!(self, Self::Response | Self::Response2) }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("Request"),
            Self::Response => f.write_str("Response"),
            Self::Response2 => f.write_str("Response2"),
            Self::Notification => f.write_str("Notification"),
            Self::Unrecognized(code) => write!(f, "Unknown Opcode: 0x{code:02x}"),
        }
    }
}

/// Fields between the opcode and the payload of requests and responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub opcode: Opcode,
    pub reserved1: u16,
    pub function: FunctionCode,
    pub reserved2: u16,
    pub sequence_number: u16,
    /// Requests only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u32>,
    /// Requests and responses carry one byte of unknown meaning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown: Option<u8>,
}

/// Decode the envelope of a request or response; the opcode is already read.
///
/// Unrecognised opcodes stop after the sequence number.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] when a field is cut off.
pub fn decode_envelope(reader: &mut Reader<'_, '_>, opcode: Opcode) -> Result<Envelope, DecodeError> {
    let reserved1 = reader.u16()?;
    let start = reader.position();
    let function = FunctionCode::from_code(reader.u16()?);
    reader.label(start, &format_args!("Function: [{function}]"));
    let reserved2 = reader.u16()?;
    let start = reader.position();
    let sequence_number = reader.u16()?;
    reader.label(start, &format_args!("Seq={sequence_number}"));
    let (session_id, unknown) = match opcode {
        Opcode::Request => {
            let start = reader.position();
            let session_id = reader.u32()?;
            reader.label(start, &format_args!("Session Id: 0x{session_id:08x}"));
            (Some(session_id), Some(reader.u8()?))
        }
        op if op.is_response() => (None, Some(reader.u8()?)),
        _ => (None, None),
    };
    Ok(Envelope {
        opcode,
        reserved1,
        function,
        reserved2,
        sequence_number,
        session_id,
        unknown,
    })
}
