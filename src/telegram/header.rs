//! Fixed 4-byte header and trailer.
//!
//! Both carry the protocol id, the PDU type and a big-endian data length.
//! KeepAlive telegrams reuse the length bytes for a sequence number and a
//! reserved byte and never have a payload.

use std::fmt;

use serde::Serialize;

use crate::{
    byte_order::{read_network_u16, write_network_u16},
    error::ProtocolMismatch,
};

/// First byte of every header and trailer.
pub const PROTOCOL_ID: u8 = 0x72;
/// Length of the header, and of the trailer when present.
pub const HEADER_LEN: usize = 4;

/// PDU type carried in the second header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PduType {
    Connect,
    Data,
    /// Data from firmware 1.5 or later, with the integrity block moved
    /// directly behind the header.
    DataFw1_5,
    KeepAlive,
    Unrecognized(u8),
}

impl PduType {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Connect,
            0x02 => Self::Data,
            0x03 => Self::DataFw1_5,
            0xff => Self::KeepAlive,
            other => Self::Unrecognized(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Connect => 0x01,
            Self::Data => 0x02,
            Self::DataFw1_5 => 0x03,
            Self::KeepAlive => 0xff,
            Self::Unrecognized(code) => code,
        }
    }

    /// Returns the PDU type name as a static string for metrics and logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Data => "data",
            Self::DataFw1_5 => "data_fw1_5",
            Self::KeepAlive => "keep_alive",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    /// Whether a header integrity block follows the header.
    #[must_use]
    pub const fn has_header_integrity(self) -> bool { matches!(self, Self::DataFw1_5) }
}

impl fmt::Display for PduType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("Connect"),
            Self::Data => f.write_str("Data"),
            Self::DataFw1_5 => f.write_str("DataFW1_5"),
            Self::KeepAlive => f.write_str("Keep Alive"),
            Self::Unrecognized(code) => write!(f, "PDU-Type: 0x{code:02x}"),
        }
    }
}

/// Last two bytes of a header or trailer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum HeaderField {
    DataLength { length: u16 },
    KeepAlive { sequence_number: u8, reserved: u8 },
}

/// Decoded header or trailer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    pub protocol_id: u8,
    pub pdu_type: PduType,
    pub field: HeaderField,
}

impl Header {
    /// Build a data header for `pdu_type` declaring `length` data bytes.
    #[must_use]
    pub const fn data(pdu_type: PduType, length: u16) -> Self {
        Self {
            protocol_id: PROTOCOL_ID,
            pdu_type,
            field: HeaderField::DataLength { length },
        }
    }

    /// Interpret four bytes as a header without validating them.
    #[must_use]
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        let pdu_type = PduType::from_code(bytes[1]);
        let field = if matches!(pdu_type, PduType::KeepAlive) {
            HeaderField::KeepAlive {
                sequence_number: bytes[2],
                reserved: bytes[3],
            }
        } else {
            HeaderField::DataLength {
                length: read_network_u16([bytes[2], bytes[3]]),
            }
        };
        Self {
            protocol_id: bytes[0],
            pdu_type,
            field,
        }
    }

    /// Validate and decode the header at the start of `segment`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolMismatch`] when the segment is shorter than the
    /// header or does not start with [`PROTOCOL_ID`].
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::telegram::{Header, PduType};
    ///
    /// let header = Header::parse(&[0x72, 0x02, 0x00, 0x08]).expect("valid header");
    /// assert_eq!(header.pdu_type, PduType::Data);
    /// assert_eq!(header.data_length(), Some(8));
    /// ```
    pub fn parse(segment: &[u8]) -> Result<Self, ProtocolMismatch> {
        let Some(&[protocol_id, pdu, b2, b3]) = segment.first_chunk::<HEADER_LEN>() else {
            return Err(ProtocolMismatch::TooShort { len: segment.len() });
        };
        if protocol_id != PROTOCOL_ID {
            return Err(ProtocolMismatch::WrongProtocolId { found: protocol_id });
        }
        Ok(Self::from_bytes([protocol_id, pdu, b2, b3]))
    }

    /// Declared data length; `None` for KeepAlive.
    #[must_use]
    pub const fn data_length(&self) -> Option<u16> {
        match self.field {
            HeaderField::DataLength { length } => Some(length),
            HeaderField::KeepAlive { .. } => None,
        }
    }

    /// Whether a segment of `total_len` bytes ends with a trailer.
    ///
    /// A trailer is present when more than four bytes follow the declared
    /// data length. KeepAlive headers never have one.
    #[must_use]
    pub fn has_trailer(&self, total_len: usize) -> bool {
        self.data_length()
            .is_some_and(|length| total_len > usize::from(length) + HEADER_LEN)
    }

    /// Encode the header back into its four wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        match self.field {
            HeaderField::DataLength { length } => {
                let [hi, lo] = write_network_u16(length);
                [self.protocol_id, self.pdu_type.code(), hi, lo]
            }
            HeaderField::KeepAlive {
                sequence_number,
                reserved,
            } => [self.protocol_id, self.pdu_type.code(), sequence_number, reserved],
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            HeaderField::DataLength { length } => {
                write!(f, "PDU-Type: {}, Data length: {length}", self.pdu_type)
            }
            HeaderField::KeepAlive {
                sequence_number, ..
            } => write!(f, "PDU-Type: {}, KeepAliveSeq={sequence_number}", self.pdu_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty(&[], ProtocolMismatch::TooShort { len: 0 })]
    #[case::three_bytes(&[0x72, 0x02, 0x00], ProtocolMismatch::TooShort { len: 3 })]
    #[case::s7comm(&[0x32, 0x01, 0x00, 0x00], ProtocolMismatch::WrongProtocolId { found: 0x32 })]
    fn rejects_foreign_segments(#[case] segment: &[u8], #[case] expected: ProtocolMismatch) {
        assert_eq!(Header::parse(segment), Err(expected));
    }

    #[test]
    fn keep_alive_reads_sequence_number() {
        let header = Header::parse(&[0x72, 0xff, 0x05, 0x00]).expect("keep alive");
        assert_eq!(header.pdu_type, PduType::KeepAlive);
        assert_eq!(header.field, HeaderField::KeepAlive {
            sequence_number: 5,
            reserved: 0
        });
        assert!(!header.has_trailer(4));
        assert_eq!(header.to_string(), "PDU-Type: Keep Alive, KeepAliveSeq=5");
    }

    #[rstest]
    #[case::whole(21, true)]
    #[case::exactly_header_and_data(17, false)]
    #[case::fragment(1000, true)]
    fn trailer_follows_declared_length(#[case] total_len: usize, #[case] expected: bool) {
        let header = Header::data(PduType::Data, 13);
        assert_eq!(header.has_trailer(total_len), expected);
    }

    #[rstest]
    #[case::data([0x72, 0x02, 0x01, 0x2c])]
    #[case::fw1_5([0x72, 0x03, 0x00, 0x40])]
    #[case::keep_alive([0x72, 0xff, 0x09, 0x00])]
    fn bytes_survive_a_parse(#[case] bytes: [u8; 4]) {
        assert_eq!(Header::from_bytes(bytes).to_bytes(), bytes);
    }

    #[test]
    fn only_fw1_5_has_a_header_integrity_block() {
        assert!(PduType::DataFw1_5.has_header_integrity());
        assert!(!PduType::Data.has_header_integrity());
        assert_eq!(PduType::from_code(0x03), PduType::DataFw1_5);
        assert_eq!(PduType::from_code(0x07).to_string(), "PDU-Type: 0x07");
    }
}
