//! Fragment inference and reassembly.
//!
//! The transport hands over one segment at a time together with the
//! identity of its connection. [`AnalysisSession`] decides from the trailer
//! alone whether the segment is a whole telegram or part of a run, buffers
//! runs per anchor segment and hands back a [`Telegram`] once the last
//! fragment arrives.

pub mod error;
pub mod id;
mod session;

use bytes::Bytes;
pub use error::ReassemblyError;
pub use id::{ConnectionId, SegmentId};
use serde::Serialize;
pub use session::AnalysisSession;

use crate::{
    config::DecoderConfig,
    error::DecodeError,
    hooks::DecodeObserver,
    telegram::{DecodedTelegram, decode_telegram_with},
};

/// Role of a segment within a telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentClass {
    /// The segment is a whole telegram.
    NoFragment,
    First,
    Inner,
    Last,
}

impl FragmentClass {
    /// Returns the class name as a static string for metrics and logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::reassembly::FragmentClass;
    ///
    /// assert_eq!(FragmentClass::NoFragment.as_str(), "no_fragment");
    /// assert_eq!(FragmentClass::Last.as_str(), "last");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoFragment => "no_fragment",
            Self::First => "first",
            Self::Inner => "inner",
            Self::Last => "last",
        }
    }
}

/// Fragmentation state a connection is left in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing seen yet.
    #[default]
    New,
    /// The last telegram was whole or a run just closed.
    NoFragment,
    First { anchor: SegmentId },
    Inner { anchor: SegmentId },
}

impl ConnectionState {
    /// Classify the next segment and compute the following state.
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::reassembly::{ConnectionState, FragmentClass, SegmentId};
    ///
    /// let anchor = SegmentId::new(1);
    /// let (class, next) = ConnectionState::New.advance(false, anchor);
    /// assert_eq!(class, FragmentClass::First);
    /// assert_eq!(next.advance(true, SegmentId::new(2)).0, FragmentClass::Last);
    /// ```
    #[must_use]
    pub const fn advance(self, has_trailer: bool, segment: SegmentId) -> (FragmentClass, Self) {
        match (self, has_trailer) {
            (Self::New | Self::NoFragment, true) => (FragmentClass::NoFragment, Self::NoFragment),
            (Self::New | Self::NoFragment, false) => {
                (FragmentClass::First, Self::First { anchor: segment })
            }
            (Self::First { anchor } | Self::Inner { anchor }, false) => {
                (FragmentClass::Inner, Self::Inner { anchor })
            }
            (Self::First { .. } | Self::Inner { .. }, true) => {
                (FragmentClass::Last, Self::NoFragment)
            }
        }
    }
}

/// Telegram bytes ready for [`decode_telegram_with`].
///
/// Reassembled telegrams get a fresh header declaring the combined data
/// length, followed by the last fragment's integrity block for firmware
/// 1.5, the concatenated fragment payloads and the last fragment's trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Telegram {
    bytes: Bytes,
    segments: Vec<SegmentId>,
    stripped_integrity: Vec<Bytes>,
}

impl Telegram {
    /// Construct a new [`Telegram`].
    #[must_use]
    pub fn new(bytes: Bytes, segments: Vec<SegmentId>, stripped_integrity: Vec<Bytes>) -> Self {
        Self {
            bytes,
            segments,
            stripped_integrity,
        }
    }

    /// Borrow the telegram bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] { &self.bytes }

    /// Consume the telegram, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }

    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Segments that formed the telegram, in arrival order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentId] { &self.segments }

    /// Firmware 1.5 integrity blocks removed from each fragment.
    #[must_use]
    pub fn stripped_integrity(&self) -> &[Bytes] { &self.stripped_integrity }

    /// Whether more than one segment formed the telegram.
    #[must_use]
    pub fn is_reassembled(&self) -> bool { self.segments.len() > 1 }

    /// Decode the telegram, reporting labels to `observer`.
    ///
    /// # Errors
    ///
    /// Returns any [`DecodeError`] raised by [`decode_telegram_with`].
    pub fn decode_with(
        &self,
        config: &DecoderConfig,
        observer: &mut dyn DecodeObserver,
    ) -> Result<DecodedTelegram, DecodeError> {
        decode_telegram_with(&self.bytes, config, observer)
    }
}

/// What the caller should do with a classified segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A whole telegram is ready.
    Deliverable(Telegram),
    /// The segment was kept for a later telegram.
    Buffered,
}

/// Result of classifying one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub class: FragmentClass,
    pub outcome: Outcome,
}

impl Classification {
    /// The ready telegram, if any.
    #[must_use]
    pub fn into_telegram(self) -> Option<Telegram> {
        match self.outcome {
            Outcome::Deliverable(telegram) => Some(telegram),
            Outcome::Buffered => None,
        }
    }
}
