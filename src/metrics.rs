//! Metric helpers for `s7commp`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

use crate::{reassembly::FragmentClass, telegram::PduType};

/// Name of the counter tracking classified segments, labelled by class.
pub const SEGMENTS_TOTAL: &str = "s7commp_segments_total";
/// Name of the counter tracking decoded telegrams, labelled by PDU type.
pub const TELEGRAMS_DECODED: &str = "s7commp_telegrams_decoded_total";
/// Name of the counter tracking recorded anomalies, labelled by kind.
pub const ANOMALIES_TOTAL: &str = "s7commp_anomalies_total";
/// Name of the gauge tracking fragment runs awaiting their last fragment.
pub const RUNS_BUFFERED: &str = "s7commp_runs_buffered";

/// Record a classified segment.
pub fn inc_segments(class: FragmentClass) {
    #[cfg(feature = "metrics")]
    counter!(SEGMENTS_TOTAL, "class" => class.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = class;
}

/// Record a decoded telegram.
pub fn inc_telegrams(pdu_type: PduType) {
    #[cfg(feature = "metrics")]
    counter!(TELEGRAMS_DECODED, "pdu_type" => pdu_type.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = pdu_type;
}

/// Record an anomaly of the given kind.
pub fn inc_anomalies(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(ANOMALIES_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Set the number of buffered fragment runs.
#[cfg_attr(
    feature = "metrics",
    expect(clippy::cast_precision_loss, reason = "run counts stay far below 2^52")
)]
pub fn set_runs_buffered(runs: usize) {
    #[cfg(feature = "metrics")]
    gauge!(RUNS_BUFFERED).set(runs as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = runs;
}
