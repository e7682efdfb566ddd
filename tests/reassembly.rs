//! Reassembly of fragmented telegrams through the public API.

mod common;

use common::{framed, get_multi_variables_values, header, open_fragment, response_envelope};
use proptest::{
    collection::vec,
    prelude::any,
    prop_assert,
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};
use rstest::rstest;
use s7commp::{
    AnalysisSession,
    ConnectionId,
    FragmentClass,
    FunctionBody,
    FunctionCode,
    Outcome,
    SegmentId,
    decode_telegram,
};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha))
}

/// Split a data region into open fragments at `cuts` and one closing
/// fragment.
fn split(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        segments.push(open_fragment(0x02, &data[start..cut]));
        start = cut;
    }
    segments.push(framed(0x02, &data[start..]));
    segments
}

#[rstest]
#[case::two_segments(&[12])]
#[case::three_segments(&[5, 20])]
#[case::four_segments(&[1, 2, 20])]
fn split_read_response_decodes_like_the_whole(#[case] cuts: &[usize]) {
    let mut data = response_envelope(0x054c, 3);
    data.extend(get_multi_variables_values());
    let whole = decode_telegram(&framed(0x02, &data)).expect("whole telegram");

    let mut session = AnalysisSession::new();
    let connection = ConnectionId::new(1);
    let mut delivered = Vec::new();
    for (segment, id) in split(&data, cuts).iter().zip(100..) {
        let classification = session
            .classify_and_maybe_buffer(segment, connection, SegmentId::new(id))
            .expect("classified");
        if let Outcome::Deliverable(telegram) = classification.outcome {
            delivered.push(telegram);
        }
    }

    let [telegram] = delivered.as_slice() else {
        panic!("expected exactly one telegram, got {}", delivered.len());
    };
    assert_eq!(telegram.segments().len(), cuts.len() + 1);
    let reassembled = decode_telegram(telegram.bytes()).expect("reassembled telegram");
    assert_eq!(reassembled.body, whole.body);
    assert!(matches!(
        reassembled.body,
        Some(FunctionBody::GetMultiVariablesResponse(_))
    ));
    assert!(reassembled.anomalies.is_empty());
}

#[test]
fn keep_alive_and_other_connections_pass_through_a_run() {
    let mut data = response_envelope(0x054c, 3);
    data.extend(get_multi_variables_values());
    let segments = split(&data, &[8]);

    let fragmented = ConnectionId::new(1);
    let other = ConnectionId::new(2);
    let mut session = AnalysisSession::new();

    let first = session
        .classify_and_maybe_buffer(&segments[0], fragmented, SegmentId::new(1))
        .expect("first");
    assert_eq!(first.class, FragmentClass::First);

    let keep_alive = session
        .classify_and_maybe_buffer(&[0x72, 0xff, 0x01, 0x00], fragmented, SegmentId::new(2))
        .expect("keep alive");
    assert!(keep_alive.into_telegram().is_some());

    let mut unrelated = response_envelope(0x0560, 4);
    unrelated.push(0x00);
    let whole = session
        .classify_and_maybe_buffer(&framed(0x02, &unrelated), other, SegmentId::new(3))
        .expect("other connection");
    let whole = whole.into_telegram().expect("whole telegram");
    assert_eq!(
        decode_telegram(whole.bytes()).expect("decode").function(),
        Some(FunctionCode::EndSequence)
    );

    let last = session
        .classify_and_maybe_buffer(&segments[1], fragmented, SegmentId::new(4))
        .expect("last");
    assert_eq!(last.class, FragmentClass::Last);
    let telegram = last.into_telegram().expect("reassembled");
    assert_eq!(telegram.segments(), [SegmentId::new(1), SegmentId::new(4)]);
}

#[test]
fn any_split_preserves_the_payload() {
    let strategy = (vec(any::<u8>(), 2..120), vec(any::<usize>(), 1..5));
    let mut runner = deterministic_runner(256);
    runner
        .run(&strategy, |(data, raw_cuts)| {
            let mut cuts: Vec<usize> = raw_cuts
                .into_iter()
                .map(|cut| 1 + cut % (data.len() - 1))
                .collect();
            cuts.sort_unstable();
            cuts.dedup();
            let segments = split(&data, &cuts);

            let mut session = AnalysisSession::new();
            let connection = ConnectionId::new(7);
            let mut classes = Vec::new();
            let mut delivered = None;
            for (segment, id) in segments.iter().zip(1..) {
                let classification = session
                    .classify_and_maybe_buffer(segment, connection, SegmentId::new(id))
                    .expect("classified");
                classes.push(classification.class);
                delivered = classification.into_telegram().or(delivered);
            }

            prop_assert_eq!(classes.first(), Some(&FragmentClass::First));
            prop_assert_eq!(classes.last(), Some(&FragmentClass::Last));
            prop_assert!(
                classes[1..classes.len() - 1]
                    .iter()
                    .all(|class| *class == FragmentClass::Inner)
            );

            let telegram = delivered.expect("last fragment delivers");
            let mut expected = header(0x02, 0).to_vec();
            for segment in &segments {
                expected.extend_from_slice(&segment[4..]);
            }
            let declared = u16::try_from(expected.len() - 8).expect("small telegram");
            expected[..4].copy_from_slice(&header(0x02, declared));
            prop_assert_eq!(telegram.bytes(), expected.as_slice());
            prop_assert_eq!(session.buffered_len(), 0);
            Ok(())
        })
        .expect("every split should reassemble");
}
