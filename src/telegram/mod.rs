//! Telegram decoder: header, envelope, function payload and tail blocks.
//!
//! A telegram is a 4-byte header, a data region and, when the segment is
//! longer than the declared data length plus four, a 4-byte trailer. The
//! data region opens with the opcode and envelope, continues with the
//! function payload and may end with an object qualifier and an integrity
//! block. Firmware 1.5 and later move the integrity digest directly behind
//! the header and leave only its id at the end.
//!
//! Decoding is best effort. Only a missing or foreign header is an error;
//! failures inside the data region become anomalies on the returned
//! [`DecodedTelegram`] and the undecoded rest is kept as raw bytes. A bad
//! entry in a value list keeps the body with the entries before it and
//! leaves the rest, from the bad entry's key on, as raw bytes. Any other
//! failure leaves the whole section it hit (integrity block, body,
//! qualifier or tail) as raw bytes.

mod envelope;
mod header;
mod integrity;
mod qualifier;

use bytes::Bytes;
pub use envelope::{Envelope, Opcode, decode_envelope};
pub use header::{HEADER_LEN, Header, HeaderField, PROTOCOL_ID, PduType};
pub use integrity::{DIGEST_LEN, IntegrityBlock, TrailingIntegrity, decode_integrity_block};
pub use qualifier::{OBJECT_QUALIFIER_ID, ObjectQualifier, find_object_qualifier};
use serde::Serialize;

use crate::{
    config::DecoderConfig,
    cursor::Reader,
    error::{Anomaly, DecodeError},
    function::{self, FunctionBody, FunctionCode, decode_notification},
    hooks::{DecodeObserver, NoopObserver, Span},
    metrics,
};

/// Everything decoded from one telegram.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedTelegram {
    pub header: Header,
    /// Integrity block behind the header of firmware 1.5 data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_integrity: Option<IntegrityBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opcode: Option<Opcode>,
    /// Absent for notifications and KeepAlive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Envelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<FunctionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_qualifier: Option<ObjectQualifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<TrailingIntegrity>,
    /// Offset of the first byte left undecoded in the data region.
    ///
    /// Everything before it is covered by the decoded parts; a failed section
    /// starts here.
    pub raw_offset: usize,
    /// Data region bytes nothing decoded.
    #[serde(skip_serializing_if = "Bytes::is_empty")]
    pub raw: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<Header>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
}

impl DecodedTelegram {
    fn new(header: Header, trailer: Option<Header>) -> Self {
        Self {
            header,
            header_integrity: None,
            opcode: None,
            envelope: None,
            body: None,
            object_qualifier: None,
            integrity: None,
            raw_offset: HEADER_LEN,
            raw: Bytes::new(),
            trailer,
            anomalies: Vec::new(),
        }
    }

    /// Function code from the envelope, if one was decoded.
    #[must_use]
    pub fn function(&self) -> Option<FunctionCode> { self.envelope.map(|e| e.function) }

    #[must_use]
    pub fn sequence_number(&self) -> Option<u16> { self.envelope.map(|e| e.sequence_number) }

    #[must_use]
    pub const fn is_keep_alive(&self) -> bool { matches!(self.header.pdu_type, PduType::KeepAlive) }
}

/// Decode a telegram with the default configuration and no observer.
///
/// # Errors
///
/// Returns [`DecodeError::NotThisProtocol`] when `bytes` is shorter than
/// the header or does not start with the protocol id.
///
/// # Examples
///
/// ```
/// use s7commp::telegram::{PduType, decode_telegram};
///
/// let telegram = decode_telegram(&[0x72, 0xff, 0x05, 0x00]).expect("keep alive");
/// assert_eq!(telegram.header.pdu_type, PduType::KeepAlive);
/// assert!(telegram.trailer.is_none());
/// ```
pub fn decode_telegram(bytes: &[u8]) -> Result<DecodedTelegram, DecodeError> {
    decode_telegram_with(bytes, &DecoderConfig::default(), &mut NoopObserver)
}

/// Decode a telegram, reporting labels and anomalies to `observer`.
///
/// # Errors
///
/// Returns [`DecodeError::NotThisProtocol`] when `bytes` is shorter than
/// the header or does not start with the protocol id.
pub fn decode_telegram_with(
    bytes: &[u8],
    config: &DecoderConfig,
    observer: &mut dyn DecodeObserver,
) -> Result<DecodedTelegram, DecodeError> {
    let header = Header::parse(bytes)?;
    let has_trailer = header.has_trailer(bytes.len());
    let data_end = if has_trailer {
        (bytes.len() - HEADER_LEN).max(HEADER_LEN)
    } else {
        bytes.len()
    };
    let trailer = bytes
        .last_chunk::<HEADER_LEN>()
        .filter(|_| has_trailer)
        .map(|chunk| Header::from_bytes(*chunk));
    let mut telegram = DecodedTelegram::new(header, trailer);

    {
        let mut reader = Reader::new(&bytes[..data_end], 0, *config, observer);
        reader.skip(HEADER_LEN)?;
        reader.label(0, &header);
        let decoded = if header.pdu_type == PduType::KeepAlive {
            Ok(())
        } else {
            decode_data(&mut reader, &mut telegram)
        };
        if let Err(error) = decoded {
            log::debug!(
                "abandoning data region at offset {:?}: {error} ({})",
                error.offset(),
                error.default_recovery().as_str()
            );
            if let Some(anomaly) = Anomaly::from_error(&error) {
                reader.record(anomaly);
            }
            reader.seek(telegram.raw_offset);
        }
        let raw_offset = reader.position();
        telegram.raw_offset = raw_offset;
        telegram.raw = Bytes::copy_from_slice(reader.rest());
        if !telegram.raw.is_empty() {
            reader.seek(data_end);
            reader.label(raw_offset, &format_args!("Data: {} byte(s)", telegram.raw.len()));
        }
        telegram.anomalies = reader.take_anomalies();
    }

    if let Some(trailer) = &telegram.trailer {
        observer.on_label(Span::between(data_end, bytes.len()), &format_args!("Trailer: {trailer}"));
    }

    metrics::inc_telegrams(header.pdu_type);
    for anomaly in &telegram.anomalies {
        metrics::inc_anomalies(anomaly.kind());
    }
    log::debug!(
        "decoded {} telegram: {} byte(s), function {:?}, {} anomaly(ies)",
        header.pdu_type.as_str(),
        bytes.len(),
        telegram.function(),
        telegram.anomalies.len()
    );
    Ok(telegram)
}

fn decode_data(
    reader: &mut Reader<'_, '_>,
    telegram: &mut DecodedTelegram,
) -> Result<(), DecodeError> {
    let pdu_type = telegram.header.pdu_type;
    telegram.raw_offset = reader.position();
    if pdu_type.has_header_integrity() {
        telegram.header_integrity = Some(decode_integrity_block(reader, false)?);
        telegram.raw_offset = reader.position();
    }
    if reader.is_at_end() {
        return Ok(());
    }

    let start = reader.position();
    let opcode = Opcode::from_code(reader.u8()?);
    reader.label(start, &format_args!("Op: [{opcode}]"));
    telegram.opcode = Some(opcode);
    telegram.raw_offset = reader.position();

    let mut request_function = None;
    if opcode == Opcode::Notification {
        telegram.body = Some(FunctionBody::Notification(decode_notification(reader)?));
    } else {
        let envelope = decode_envelope(reader, opcode)?;
        telegram.envelope = Some(envelope);
        telegram.raw_offset = reader.position();
        telegram.body = match opcode {
            Opcode::Request => {
                request_function = Some(envelope.function);
                function::decode_request(reader, envelope.function, pdu_type)?
            }
            op if op.is_response() => function::decode_response(reader, envelope.function, pdu_type)?,
            _ => None,
        };
    }
    if reader.is_abandoned() {
        return Ok(());
    }
    telegram.raw_offset = reader.position();

    if let Some(function) = request_function {
        if function.carries_object_qualifier() && reader.remaining() > 10 {
            telegram.object_qualifier = find_object_qualifier(reader)?;
            if reader.is_abandoned() {
                return Ok(());
            }
            telegram.raw_offset = reader.position();
        }
        let padding = function.request_padding();
        if padding > 0 {
            let start = reader.position();
            reader.skip(padding)?;
            reader.label(start, &format_args!("Request {function} unknown {padding} byte(s)"));
        }
    }

    let has_integrity_id = telegram
        .body
        .as_ref()
        .is_none_or(FunctionBody::has_integrity_id);
    if pdu_type == PduType::DataFw1_5 {
        if reader.remaining() > 4 && has_integrity_id {
            let start = reader.position();
            let id = reader.varuint32()?;
            reader.label(start, &format_args!("Integrity Id: {id}"));
            telegram.integrity = Some(TrailingIntegrity::Id { id });
        }
    } else if reader.remaining() >= usize::from(DIGEST_LEN) {
        telegram.integrity = Some(TrailingIntegrity::Block(decode_integrity_block(
            reader,
            has_integrity_id,
        )?));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
