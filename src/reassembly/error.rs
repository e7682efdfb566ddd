//! Errors raised while classifying and buffering segments.

use std::num::NonZeroUsize;

use thiserror::Error;

use super::SegmentId;
use crate::error::{DecodeError, ProtocolMismatch};

/// Errors produced by [`AnalysisSession`](super::AnalysisSession).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The segment does not carry this protocol; no state was touched.
    #[error("not an S7comm-plus segment: {0}")]
    NotThisProtocol(#[from] ProtocolMismatch),

    /// A run would grow past the configured cap and was dropped.
    #[error("telegram anchored at segment {anchor} too large: attempted {attempted} bytes, limit {limit}")]
    MessageTooLarge {
        /// First segment of the run.
        anchor: SegmentId,
        /// Size the telegram would have reached.
        attempted: usize,
        /// Configured maximum.
        limit: NonZeroUsize,
    },

    /// An inner or last fragment refers to a run that is no longer buffered.
    #[error("no buffered run for anchor segment {anchor}")]
    MissingRun {
        /// First segment of the missing run.
        anchor: SegmentId,
    },

    /// The integrity block of a firmware 1.5 fragment could not be read.
    #[error("fragment {segment} has a malformed integrity block: {source}")]
    FragmentIntegrity {
        /// Segment carrying the block.
        segment: SegmentId,
        /// Underlying decode failure.
        source: DecodeError,
    },
}
