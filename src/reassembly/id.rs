use derive_more::{Display, From, Into};
use serde::Serialize;

/// Identity of one logical connection, assigned by whoever demultiplexes
/// the transport.
///
/// # Examples
///
/// ```
/// use s7commp::reassembly::ConnectionId;
/// let id = ConnectionId::new(7);
/// assert_eq!(id.get(), 7);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into, Serialize)]
#[display("{_0}")]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

/// Stable identity of one network segment, such as its frame number in a
/// capture. Decisions are cached against it.
///
/// # Examples
///
/// ```
/// use s7commp::reassembly::SegmentId;
/// let id = SegmentId::from(42);
/// assert_eq!(u64::from(id), 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into, Serialize)]
#[display("{_0}")]
pub struct SegmentId(u64);

impl SegmentId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}
