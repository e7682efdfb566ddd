//! Error taxonomy for the S7comm-plus decoder.
//!
//! Decoding distinguishes hard failures, which stop the current telegram or
//! scope, from anomalies, which are recorded on the decoded result while
//! decoding carries on.
//!
//! # Error Categories
//!
//! - [`DecodeError::Truncated`]: the buffer ended in the middle of a field.
//! - [`DecodeError::UnknownDatatype`]: a value carried a datatype tag outside the recognised set.
//! - [`DecodeError::DepthExceeded`]: struct or object nesting passed the configured limit.
//! - [`DecodeError::NotThisProtocol`]: the segment is too short or has the wrong protocol id.
//!
//! # Recovery
//!
//! [`DecodeError::default_recovery`] maps each variant onto a [`Recovery`]
//! policy so callers can decide what to keep.

use serde::Serialize;
use thiserror::Error;

/// Reason a segment was rejected before any decoding took place.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ProtocolMismatch {
    /// Fewer bytes than the fixed 4-byte header.
    #[error("segment of {len} byte(s) is shorter than the 4-byte header")]
    TooShort {
        /// Length of the rejected segment.
        len: usize,
    },
    /// The first byte is not the S7comm-plus protocol id.
    #[error("protocol id 0x{found:02x} is not 0x72")]
    WrongProtocolId {
        /// Byte found where the protocol id was expected.
        found: u8,
    },
}

/// Errors raised while decoding a telegram or one of its scopes.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer exhausted mid-field.
    #[error("truncated at offset {offset}: need {needed} byte(s), {available} available")]
    Truncated {
        /// Absolute offset of the field that could not be read.
        offset: usize,
        /// Bytes the field required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },

    /// Datatype tag not in the recognised set.
    #[error("unknown datatype 0x{code:02x} at offset {offset}")]
    UnknownDatatype {
        /// Raw datatype code.
        code: u8,
        /// Absolute offset of the datatype byte.
        offset: usize,
    },

    /// Nesting of structs or objects passed the configured limit.
    #[error("nesting deeper than {limit} level(s) at offset {offset}")]
    DepthExceeded {
        /// Absolute offset where the next level would have started.
        offset: usize,
        /// Configured maximum depth.
        limit: usize,
    },

    /// The segment does not carry this protocol.
    #[error("not an S7comm-plus telegram: {0}")]
    NotThisProtocol(#[from] ProtocolMismatch),
}

/// How a caller should treat a [`DecodeError`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Recovery {
    /// Stop the function body; keep header, envelope and trailer.
    #[default]
    AbortTelegram,
    /// Stop the current value or subtree and surface the rest as raw bytes.
    SkipScope,
    /// Hand the segment back untouched; it belongs to another protocol.
    Reject,
}

impl Recovery {
    /// Returns the policy name as a static string for metrics and logging.
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::error::Recovery;
    ///
    /// assert_eq!(Recovery::AbortTelegram.as_str(), "abort_telegram");
    /// assert_eq!(Recovery::Reject.as_str(), "reject");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AbortTelegram => "abort_telegram",
            Self::SkipScope => "skip_scope",
            Self::Reject => "reject",
        }
    }
}

impl DecodeError {
    /// Returns the recommended recovery for this error.
    #[must_use]
    pub const fn default_recovery(&self) -> Recovery {
        match self {
            Self::Truncated { .. } => Recovery::AbortTelegram,
            Self::UnknownDatatype { .. } | Self::DepthExceeded { .. } => Recovery::SkipScope,
            Self::NotThisProtocol(_) => Recovery::Reject,
        }
    }

    /// Absolute offset at which decoding stopped, if the error has one.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Truncated { offset, .. }
            | Self::UnknownDatatype { offset, .. }
            | Self::DepthExceeded { offset, .. } => Some(*offset),
            Self::NotThisProtocol(_) => None,
        }
    }
}

/// Non-fatal decoding condition recorded on a decoded telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The function body ended early; the rest of the data region is raw.
    Truncated {
        /// Offset of the unreadable field.
        offset: usize,
        /// Bytes the field required.
        needed: usize,
        /// Bytes that were left.
        available: usize,
    },
    /// A value used an unknown datatype; the rest of the data region is raw.
    UnknownDatatype {
        /// Raw datatype code.
        code: u8,
        /// Offset of the datatype byte.
        offset: usize,
    },
    /// Nesting limit reached; the rest of the data region is raw.
    DepthExceeded {
        /// Offset of the level that was refused.
        offset: usize,
        /// Configured maximum depth.
        limit: usize,
    },
    /// An integrity block declared a digest length other than 32.
    IntegrityLengthMismatch {
        /// Offset of the digest length byte.
        offset: usize,
        /// Declared digest length.
        declared: u8,
    },
    /// A `StartObject` ended on an unrecognised element instead of `TermObject`.
    UnterminatedObject {
        /// Offset of the element byte that stopped the object.
        offset: usize,
        /// Relation id of the open object.
        relation_id: u32,
    },
}

impl Anomaly {
    /// Short name used as a metrics label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Truncated { .. } => "truncated",
            Self::UnknownDatatype { .. } => "unknown_datatype",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::IntegrityLengthMismatch { .. } => "integrity_length_mismatch",
            Self::UnterminatedObject { .. } => "unterminated_object",
        }
    }

    /// Convert a scope-aborting error into the anomaly recorded for it.
    ///
    /// Returns `None` for [`DecodeError::NotThisProtocol`], which is never
    /// recorded on a telegram.
    #[must_use]
    pub const fn from_error(error: &DecodeError) -> Option<Self> {
        match *error {
            DecodeError::Truncated {
                offset,
                needed,
                available,
            } => Some(Self::Truncated {
                offset,
                needed,
                available,
            }),
            DecodeError::UnknownDatatype { code, offset } => {
                Some(Self::UnknownDatatype { code, offset })
            }
            DecodeError::DepthExceeded { offset, limit } => {
                Some(Self::DepthExceeded { offset, limit })
            }
            DecodeError::NotThisProtocol(_) => None,
        }
    }
}
