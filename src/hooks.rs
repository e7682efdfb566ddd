//! Observer callbacks invoked while telegrams are decoded.
//!
//! [`DecodeObserver`] is the seam to a presentation layer: the decoder hands
//! it human-readable labels for the fields it decodes, the anomalies it
//! records and the fragment decisions it takes. Nothing an observer does can
//! change how bytes are interpreted.

use std::fmt;

use serde::Serialize;

use crate::{
    error::Anomaly,
    reassembly::{ConnectionId, FragmentClass, SegmentId},
};

/// Byte range a label refers to, as absolute offsets into the telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Offset of the first byte.
    pub offset: usize,
    /// Number of bytes covered.
    pub len: usize,
}

impl Span {
    /// Create a span covering `start..end`.
    #[must_use]
    pub const fn between(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            len: end.saturating_sub(start),
        }
    }
}

/// Receives labels and diagnostics emitted during decoding.
///
/// All methods default to no-ops so implementations only override what they
/// render.
///
/// # Examples
///
/// ```
/// use s7commp::hooks::{DecodeObserver, Span};
///
/// struct Printer;
///
/// impl DecodeObserver for Printer {
///     fn on_label(&mut self, span: Span, label: &dyn std::fmt::Display) {
///         println!("{:>5} +{:<3} {label}", span.offset, span.len);
///     }
/// }
/// ```
pub trait DecodeObserver {
    /// Called once per labelled field or element.
    fn on_label(&mut self, _span: Span, _label: &dyn fmt::Display) {}

    /// Called when a non-fatal anomaly is recorded.
    fn on_anomaly(&mut self, _anomaly: &Anomaly) {}

    /// Called after a segment has been classified for reassembly.
    fn on_fragment(&mut self, _connection: ConnectionId, _segment: SegmentId, _class: FragmentClass) {
    }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl DecodeObserver for NoopObserver {}

/// One label captured by [`LabelRecorder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordedLabel {
    /// Bytes the label describes.
    pub span: Span,
    /// Rendered label text.
    pub text: String,
}

/// Observer that keeps every label and anomaly in memory.
#[derive(Clone, Debug, Default)]
pub struct LabelRecorder {
    labels: Vec<RecordedLabel>,
    anomalies: Vec<Anomaly>,
    fragments: Vec<(ConnectionId, SegmentId, FragmentClass)>,
}

impl LabelRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Labels captured so far, in emission order.
    #[must_use]
    pub fn labels(&self) -> &[RecordedLabel] { &self.labels }

    /// Anomalies captured so far.
    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] { &self.anomalies }

    /// Fragment decisions captured so far.
    #[must_use]
    pub fn fragments(&self) -> &[(ConnectionId, SegmentId, FragmentClass)] { &self.fragments }

    /// Whether any captured label text contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.labels.iter().any(|label| label.text.contains(needle))
    }

    /// Drain the captured labels, leaving the recorder empty.
    pub fn take_labels(&mut self) -> Vec<RecordedLabel> { std::mem::take(&mut self.labels) }
}

impl DecodeObserver for LabelRecorder {
    fn on_label(&mut self, span: Span, label: &dyn fmt::Display) {
        self.labels.push(RecordedLabel {
            span,
            text: label.to_string(),
        });
    }

    fn on_anomaly(&mut self, anomaly: &Anomaly) { self.anomalies.push(*anomaly); }

    fn on_fragment(&mut self, connection: ConnectionId, segment: SegmentId, class: FragmentClass) {
        self.fragments.push((connection, segment, class));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_labels_in_order() {
        let mut recorder = LabelRecorder::new();
        recorder.on_label(Span::between(0, 4), &"Header");
        recorder.on_label(Span::between(4, 5), &format_args!("Op: [{}]", "Response"));
        assert_eq!(recorder.labels().len(), 2);
        assert_eq!(recorder.labels()[1].span, Span { offset: 4, len: 1 });
        assert!(recorder.contains("Response"));
        assert_eq!(recorder.take_labels().len(), 2);
        assert!(recorder.labels().is_empty());
    }

    #[test]
    fn span_between_never_underflows() {
        assert_eq!(Span::between(10, 4).len, 0);
    }
}
