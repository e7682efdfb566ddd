//! Unit tests for the VLQ codec.

use proptest::{
    prop_assert_eq,
    prelude::any,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};
use rstest::rstest;

use super::*;

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha))
}

#[rstest]
#[case::zero(&[0x00], 0, 1)]
#[case::one_octet_max(&[0x7f], 127, 1)]
#[case::two_octets(&[0x81, 0x00], 128, 2)]
#[case::qualifier_id(&[0x89, 0x68], 1256, 2)]
#[case::full_width(&[0x8f, 0xff, 0xff, 0xff, 0x7f], u32::MAX, 5)]
fn decodes_unsigned_32(#[case] bytes: &[u8], #[case] value: u32, #[case] octets: usize) {
    assert_eq!(
        decode_varuint32(bytes, 0).expect("well-formed varuint32"),
        (value, octets)
    );
}

#[rstest]
#[case::minus_one(&[0x7f], -1, 1)]
#[case::minus_sixty_four(&[0x40], -64, 1)]
#[case::plus_sixty_three(&[0x3f], 63, 1)]
#[case::minus_sixty_five(&[0xff, 0x3f], -65, 2)]
#[case::plus_sixty_four(&[0x80, 0x40], 64, 2)]
fn decodes_signed_32(#[case] bytes: &[u8], #[case] value: i32, #[case] octets: usize) {
    assert_eq!(
        decode_varint32(bytes, 0).expect("well-formed varint32"),
        (value, octets)
    );
}

#[test]
fn ninth_octet_contributes_a_full_byte() {
    let nine = [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xff];
    let (value, octets) = decode_varuint64(&nine, 0).expect("nine-octet varuint64");
    assert_eq!(octets, 9);
    assert_eq!(value, (1_u64 << 57) | 0xff);
    // Seven bits would have lost the top bit of 0xff.
    assert_ne!(value, (1_u64 << 56) | 0x7f);
}

#[test]
fn signed_ninth_octet_is_unshifted() {
    let nine = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x80];
    let (value, octets) = decode_varint64(&nine, 0).expect("nine-octet varint64");
    assert_eq!(octets, 9);
    assert_eq!(value, -128);
}

#[test]
fn decoding_respects_start_position() {
    let buf = [0xaa, 0xbb, 0x81, 0x00, 0xcc];
    assert_eq!(decode_varuint32(&buf, 2).expect("offset decode"), (128, 2));
}

#[test]
fn max_octet_bound_is_never_exceeded() {
    let endless = [0xff; 12];
    assert_eq!(
        decode_varuint32_within(&endless, 0, 3).expect("bounded decode").1,
        3
    );
    assert_eq!(decode_varuint32(&endless, 0).expect("bounded decode").1, 5);
    assert_eq!(decode_varint32(&endless, 0).expect("bounded decode").1, 5);
    assert_eq!(decode_varuint64(&endless, 0).expect("bounded decode").1, 9);
}

#[rstest]
#[case::empty(&[], 0)]
#[case::dangling_continuation(&[0x81], 1)]
#[case::three_continuations(&[0x81, 0x82, 0x83], 3)]
fn truncation_reports_missing_offset(#[case] bytes: &[u8], #[case] offset: usize) {
    let expected = DecodeError::Truncated {
        offset,
        needed: 1,
        available: 0,
    };
    assert_eq!(decode_varuint32(bytes, 0), Err(expected));
    assert_eq!(decode_varint32(bytes, 0), Err(expected));
    assert_eq!(decode_varuint64(bytes, 0), Err(expected));
    assert_eq!(decode_varint64(bytes, 0), Err(expected));
}

#[test]
fn eight_groups_without_ninth_octet_is_truncated() {
    let eight = [0x81; 8];
    assert_eq!(
        decode_varuint64(&eight, 0),
        Err(DecodeError::Truncated {
            offset: 8,
            needed: 1,
            available: 0
        })
    );
}

#[rstest]
#[case::small(5, vec![0x05])]
#[case::needs_nine(u64::MAX, vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])]
#[case::fifty_six_bits((1 << 56) - 1, vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f])]
fn encodes_unsigned_64(#[case] value: u64, #[case] expected: Vec<u8>) {
    assert_eq!(encode_varuint64(value), expected);
}

#[test]
fn unsigned_32_round_trips() {
    let mut runner = deterministic_runner(512);
    runner
        .run(&any::<u32>(), |value| {
            let encoded = encode_varuint32(value);
            prop_assert_eq!(decode_varuint32(&encoded, 0).ok(), Some((value, encoded.len())));
            Ok(())
        })
        .expect("varuint32 should round-trip");
}

#[test]
fn signed_32_round_trips() {
    let mut runner = deterministic_runner(512);
    runner
        .run(&any::<i32>(), |value| {
            let encoded = encode_varint32(value);
            prop_assert_eq!(decode_varint32(&encoded, 0).ok(), Some((value, encoded.len())));
            Ok(())
        })
        .expect("varint32 should round-trip");
}

#[test]
fn unsigned_64_round_trips() {
    let mut runner = deterministic_runner(512);
    runner
        .run(&any::<u64>(), |value| {
            let encoded = encode_varuint64(value);
            prop_assert_eq!(decode_varuint64(&encoded, 0).ok(), Some((value, encoded.len())));
            Ok(())
        })
        .expect("varuint64 should round-trip");
}

#[test]
fn signed_64_round_trips() {
    let mut runner = deterministic_runner(512);
    runner
        .run(&any::<i64>(), |value| {
            let encoded = encode_varint64(value);
            prop_assert_eq!(decode_varint64(&encoded, 0).ok(), Some((value, encoded.len())));
            Ok(())
        })
        .expect("varint64 should round-trip");
}

#[rstest]
#[case::i32_min(i64::from(i32::MIN))]
#[case::i64_min(i64::MIN)]
#[case::i64_max(i64::MAX)]
#[case::edge_of_short_form(-(1 << 55))]
#[case::just_past_short_form(1 << 55)]
fn signed_64_edges_round_trip(#[case] value: i64) {
    let encoded = encode_varint64(value);
    assert_eq!(
        decode_varint64(&encoded, 0).expect("encoded varint64"),
        (value, encoded.len())
    );
}
