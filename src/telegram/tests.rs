//! Unit tests for the telegram decoder.

use rstest::{fixture, rstest};

use super::*;
use crate::{
    error::ProtocolMismatch,
    function::FunctionBody,
    hooks::LabelRecorder,
};

/// Wrap a data region in a header and a matching trailer.
fn framed(pdu: u8, data: &[u8]) -> Vec<u8> {
    let length = u16::try_from(data.len()).expect("data fits u16");
    let [hi, lo] = length.to_be_bytes();
    let mut bytes = vec![PROTOCOL_ID, pdu, hi, lo];
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(&[PROTOCOL_ID, pdu, hi, lo]);
    bytes
}

fn digest() -> Vec<u8> {
    let mut block = vec![DIGEST_LEN];
    block.extend(std::iter::repeat_n(0xab, usize::from(DIGEST_LEN)));
    block
}

/// GetMultiVariables response: return value 0, no values, no errors.
#[fixture]
fn get_multi_variables_response() -> Vec<u8> {
    framed(0x02, &[
        0x32, 0x00, 0x00, 0x05, 0x4c, 0x00, 0x00, 0x00, 0x01, 0x00, // envelope
        0x00, 0x00, 0x00, // return value, value list, error list
    ])
}

#[rstest]
fn response_dispatches_to_get_multi_variables(get_multi_variables_response: Vec<u8>) {
    let telegram = decode_telegram(&get_multi_variables_response).expect("telegram");
    assert_eq!(telegram.header.data_length(), Some(13));
    assert_eq!(telegram.opcode, Some(Opcode::Response));
    assert_eq!(telegram.function(), Some(FunctionCode::GetMultiVariables));
    assert_eq!(telegram.sequence_number(), Some(1));
    let Some(FunctionBody::GetMultiVariablesResponse(response)) = &telegram.body else {
        panic!("expected a GetMultiVariables response, got {:?}", telegram.body);
    };
    assert!(response.return_value.is_success());
    assert_eq!(response.return_value.error_code, 0);
    assert_eq!(response.return_value.oms_line, 0);
    assert_eq!(response.return_value.error_source, 0);
    assert!(response.values.is_empty());
    assert!(telegram.raw.is_empty());
    assert_eq!(telegram.trailer, Some(Header::data(PduType::Data, 13)));
    assert!(telegram.anomalies.is_empty());
}

#[test]
fn keep_alive_has_no_payload() {
    let telegram = decode_telegram(&[0x72, 0xff, 0x05, 0x00]).expect("keep alive");
    assert!(telegram.is_keep_alive());
    assert_eq!(telegram.header.field, HeaderField::KeepAlive {
        sequence_number: 5,
        reserved: 0
    });
    assert!(telegram.opcode.is_none());
    assert!(telegram.trailer.is_none());
    assert!(telegram.anomalies.is_empty());
}

#[rstest]
#[case::short(&[0x72, 0x02], ProtocolMismatch::TooShort { len: 2 })]
#[case::foreign(&[0x03, 0x00, 0x00, 0x16], ProtocolMismatch::WrongProtocolId { found: 0x03 })]
fn foreign_segments_are_rejected(#[case] bytes: &[u8], #[case] reason: ProtocolMismatch) {
    assert_eq!(
        decode_telegram(bytes),
        Err(DecodeError::NotThisProtocol(reason))
    );
}

#[test]
fn truncated_value_keeps_the_partial_body() {
    let bytes = framed(0x02, &[
        0x32, 0x00, 0x00, 0x05, 0x4c, 0x00, 0x00, 0x00, 0x02, 0x00, // envelope
        0x00, // return value
        0x01, 0x00, 0x04, // item 1: UDInt with no value bytes
    ]);
    let telegram = decode_telegram(&bytes).expect("telegram");
    assert_eq!(telegram.function(), Some(FunctionCode::GetMultiVariables));
    let Some(FunctionBody::GetMultiVariablesResponse(response)) = &telegram.body else {
        panic!("expected a partial response, got {:?}", telegram.body);
    };
    assert!(response.return_value.is_success());
    assert!(response.values.is_empty());
    assert!(!response.values.terminated);
    assert_eq!(telegram.anomalies, [Anomaly::Truncated {
        offset: 18,
        needed: 1,
        available: 0
    }]);
    assert_eq!(telegram.raw_offset, 15);
    assert_eq!(telegram.raw.as_ref(), [0x01, 0x00, 0x04]);
    assert!(telegram.integrity.is_none());
    assert!(telegram.trailer.is_some());
}

#[test]
fn failed_body_is_kept_whole_as_raw() {
    let bytes = framed(0x02, &[
        0x32, 0x00, 0x00, 0x04, 0xbb, 0x00, 0x00, 0x00, 0x03, 0x00, // Explore envelope
        0x00, // return value
        0x00, 0x00, // object id cut short
    ]);
    let telegram = decode_telegram(&bytes).expect("telegram");
    assert_eq!(telegram.function(), Some(FunctionCode::Explore));
    assert!(telegram.body.is_none());
    assert!(matches!(
        telegram.anomalies.as_slice(),
        [Anomaly::Truncated { offset: 15, .. }]
    ));
    assert_eq!(telegram.raw_offset, 14);
    assert_eq!(telegram.raw.as_ref(), [0x00, 0x00, 0x00]);
}

#[test]
fn cut_envelope_leaves_everything_after_the_opcode() {
    let bytes = framed(0x02, &[0x32, 0x00, 0x00, 0x05]);
    let telegram = decode_telegram(&bytes).expect("telegram");
    assert_eq!(telegram.opcode, Some(Opcode::Response));
    assert!(telegram.envelope.is_none());
    assert_eq!(telegram.raw_offset, 5);
    assert_eq!(telegram.raw.as_ref(), [0x00, 0x00, 0x05]);
}

#[test]
fn request_with_object_qualifier_and_integrity_block() {
    let mut data = vec![
        0x31, 0x00, 0x00, 0x05, 0x4c, 0x00, 0x00, 0x00, 0x02, // opcode, function, seq
        0x00, 0x00, 0x03, 0x80, 0x34, // session id, unknown
        0x90, 0x00, 0x00, 0x01, 0x01, 0x01, 0x05, // link id, one item, id 5
        0x04, 0xe8, 0x89, 0x0a, 0x00, 0x02, 0x07, 0x00, // object qualifier
        0x05, // integrity id
    ];
    data.extend(digest());
    let bytes = framed(0x02, &data);
    let mut recorder = LabelRecorder::new();
    let telegram =
        decode_telegram_with(&bytes, &DecoderConfig::default(), &mut recorder).expect("telegram");

    assert_eq!(telegram.envelope.and_then(|e| e.session_id), Some(0x380));
    assert!(matches!(
        telegram.body,
        Some(FunctionBody::GetMultiVariablesRequest(_))
    ));
    let qualifier = telegram.object_qualifier.as_ref().expect("qualifier");
    assert!(qualifier.skipped.is_empty());
    assert!(qualifier.members.get(1162).is_some());
    let Some(TrailingIntegrity::Block(block)) = &telegram.integrity else {
        panic!("expected an integrity block");
    };
    assert_eq!(block.id, Some(5));
    assert!(telegram.raw.is_empty());
    assert!(recorder.contains("Op: [Request]"));
    assert!(recorder.contains("ObjectQualifier"));
    assert!(recorder.contains("Trailer: PDU-Type: Data"));
}

#[rstest]
#[case::subscription(0x7000_0001, None, 5)]
#[case::session(0x0000_0120, Some(130), 3)]
fn fw1_5_integrity_id_follows_the_deleted_object(
    #[case] object_id: u32,
    #[case] integrity_id: Option<u32>,
    #[case] raw_len: usize,
) {
    let mut data = digest();
    data.extend_from_slice(&[0x32, 0x00, 0x00, 0x04, 0xd4, 0x00, 0x00, 0x00, 0x09, 0x00]);
    data.push(0x00);
    data.extend_from_slice(&object_id.to_be_bytes());
    data.extend_from_slice(&[0x81, 0x02, 0x00, 0x00, 0x00]);
    let telegram = decode_telegram(&framed(0x03, &data)).expect("telegram");

    let header_integrity = telegram.header_integrity.as_ref().expect("header integrity");
    assert_eq!(header_integrity.id, None);
    assert_eq!(header_integrity.digest.as_ref().map(|d| d.len()), Some(32));
    assert!(matches!(
        telegram.body,
        Some(FunctionBody::DeleteObjectResponse(_))
    ));
    let id = match telegram.integrity {
        Some(TrailingIntegrity::Id { id }) => Some(id),
        _ => None,
    };
    assert_eq!(id, integrity_id);
    assert_eq!(telegram.raw.len(), raw_len);
}

#[test]
fn bad_digest_length_is_flagged_and_decoding_continues() {
    let mut data = vec![
        0x32, 0x00, 0x00, 0x05, 0x60, 0x00, 0x00, 0x00, 0x03, 0x00, // EndSequence response
        0x00, // return value
        0x07, 0x10, // integrity id, digest length 16
    ];
    data.extend(std::iter::repeat_n(0xcd, 31));
    let telegram = decode_telegram(&framed(0x02, &data)).expect("telegram");
    assert!(matches!(
        telegram.anomalies.as_slice(),
        [Anomaly::IntegrityLengthMismatch { declared: 16, .. }]
    ));
    assert_eq!(telegram.raw.len(), 31);
}

#[test]
fn notification_skips_the_envelope() {
    let mut data = vec![0x33];
    data.extend_from_slice(&0x7000_0100_u32.to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00, 0x04, 0x00, 0x00]);
    let telegram = decode_telegram(&framed(0x02, &data)).expect("telegram");
    assert_eq!(telegram.opcode, Some(Opcode::Notification));
    assert!(telegram.envelope.is_none());
    assert!(matches!(telegram.body, Some(FunctionBody::Notification(_))));
}

#[test]
fn unknown_function_leaves_payload_raw() {
    let bytes = framed(0x02, &[
        0x32, 0x00, 0x00, 0x09, 0x99, 0x00, 0x00, 0x00, 0x04, 0x00, 0xde, 0xad,
    ]);
    let telegram = decode_telegram(&bytes).expect("telegram");
    assert_eq!(telegram.function(), Some(FunctionCode::Unrecognized(0x0999)));
    assert!(telegram.body.is_none());
    assert_eq!(telegram.raw.as_ref(), &[0xde, 0xad]);
    assert_eq!(telegram.raw_offset, 14);
}

#[test]
fn fragment_without_trailer_uses_the_whole_segment() {
    let mut bytes = vec![0x72, 0x02, 0x01, 0x00];
    bytes.extend_from_slice(&[0x32, 0x00, 0x00, 0x05, 0x4c, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00]);
    let telegram = decode_telegram(&bytes).expect("telegram");
    assert!(telegram.trailer.is_none());
    assert_eq!(telegram.function(), Some(FunctionCode::GetMultiVariables));
}
