#![doc(html_root_url = "https://docs.rs/s7commp/latest")]
//! Public API for the `s7commp` library.
//!
//! This crate decodes S7comm-plus telegrams into structured values and
//! reassembles telegrams that the transport split across several segments.
//! Decoding is best effort: malformed regions are reported as anomalies
//! next to whatever could be read.

pub mod address;
pub mod byte_order;
pub mod config;
pub mod cursor;
pub mod error;
pub mod function;
pub mod hooks;
pub mod metrics;
pub mod object;
pub mod reassembly;
pub mod return_value;
pub mod telegram;
pub mod value;
pub mod vlq;

#[cfg(test)]
mod test_helpers;

pub use config::{DecoderConfig, ReassemblyConfig};
pub use error::{Anomaly, DecodeError, ProtocolMismatch, Recovery};
pub use function::{FunctionBody, FunctionCode};
pub use hooks::{DecodeObserver, LabelRecorder, NoopObserver, Span};
pub use metrics::{ANOMALIES_TOTAL, RUNS_BUFFERED, SEGMENTS_TOTAL, TELEGRAMS_DECODED};
pub use reassembly::{
    AnalysisSession,
    Classification,
    ConnectionId,
    ConnectionState,
    FragmentClass,
    Outcome,
    ReassemblyError,
    SegmentId,
    Telegram,
};
pub use telegram::{DecodedTelegram, Header, PduType, decode_telegram, decode_telegram_with};
pub use value::{DecodedValue, ValueNode, decode_value};
