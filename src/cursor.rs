//! Bounded reader shared by every decoder.
//!
//! [`Reader`] walks one telegram buffer with absolute offsets, so errors,
//! anomalies and labels all point at the same byte a capture tool shows. The
//! readable region can end before the buffer does (the trailer is never part
//! of the data region), and every read is checked against that end.

use std::fmt;

use crate::{
    byte_order::{
        read_network_f32,
        read_network_f64,
        read_network_i16,
        read_network_u16,
        read_network_u32,
        read_network_u64,
    },
    config::DecoderConfig,
    error::{Anomaly, DecodeError},
    hooks::{DecodeObserver, Span},
    vlq,
};

/// Cursor over a telegram with nesting and diagnostics bookkeeping.
pub struct Reader<'a, 'o> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    config: DecoderConfig,
    abandoned_at: Option<usize>,
    anomalies: Vec<Anomaly>,
    observer: &'o mut dyn DecodeObserver,
}

impl fmt::Debug for Reader<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("pos", &self.pos)
            .field("end", &self.buf.len())
            .field("depth", &self.depth)
            .field("abandoned_at", &self.abandoned_at)
            .field("anomalies", &self.anomalies)
            .finish_non_exhaustive()
    }
}

impl<'a, 'o> Reader<'a, 'o> {
    /// Create a reader over `buf` positioned at `start`.
    ///
    /// Reads never go past the end of `buf`; pass a shortened slice to
    /// exclude a trailer.
    #[must_use]
    pub fn new(
        buf: &'a [u8],
        start: usize,
        config: DecoderConfig,
        observer: &'o mut dyn DecodeObserver,
    ) -> Self {
        Self {
            buf,
            pos: start.min(buf.len()),
            depth: 0,
            config,
            abandoned_at: None,
            anomalies: Vec::new(),
            observer,
        }
    }

    /// Current absolute offset.
    #[must_use]
    pub const fn position(&self) -> usize { self.pos }

    /// Move to an absolute offset, clamped to the readable end.
    pub fn seek(&mut self, pos: usize) { self.pos = pos.min(self.buf.len()); }

    /// Absolute offset one past the last readable byte.
    #[must_use]
    pub const fn end(&self) -> usize { self.buf.len() }

    /// Bytes left before the readable end.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.buf.len().saturating_sub(self.pos) }

    /// Whether the reader has reached the readable end.
    #[must_use]
    pub const fn is_at_end(&self) -> bool { self.remaining() == 0 }

    /// Current struct/object nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize { self.depth }

    /// The unread bytes, without consuming them.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] { self.buf.get(self.pos..).unwrap_or_default() }

    /// Bytes between `start` and the current position.
    #[must_use]
    pub fn since(&self, start: usize) -> &'a [u8] {
        self.buf.get(start..self.pos).unwrap_or_default()
    }

    /// Look at the next byte without consuming it.
    #[must_use]
    pub fn peek_u8(&self) -> Option<u8> { self.buf.get(self.pos).copied() }

    /// Look at a big-endian `u16` at an absolute offset.
    #[must_use]
    pub fn peek_u16_at(&self, pos: usize) -> Option<u16> {
        let bytes = self.buf.get(pos..pos.checked_add(2)?)?;
        Some(read_network_u16([bytes[0], bytes[1]]))
    }

    /// Look at the next big-endian `u32` without consuming it.
    #[must_use]
    pub fn peek_u32(&self) -> Option<u32> {
        let bytes = self.buf.get(self.pos..self.pos.checked_add(4)?)?;
        Some(read_network_u32([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }

    /// Consume `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `len` bytes remain.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| self.truncated(len))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Consume a run of bytes whose length came off the wire.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `len` bytes remain.
    pub fn counted_bytes(&mut self, len: u32) -> Result<&'a [u8], DecodeError> {
        self.bytes(usize::try_from(len).unwrap_or(usize::MAX))
    }

    /// Consume a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `N` bytes remain.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Skip `len` bytes of unknown meaning.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> { self.bytes(len).map(drop) }

    /// Consume one byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] at the readable end.
    pub fn u8(&mut self) -> Result<u8, DecodeError> { self.array::<1>().map(|[b]| b) }

    /// Consume one byte as a two's-complement `i8`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] at the readable end.
    pub fn i8(&mut self) -> Result<i8, DecodeError> { self.u8().map(u8::cast_signed) }

    /// Consume a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 2 bytes remain.
    pub fn u16(&mut self) -> Result<u16, DecodeError> { self.array().map(read_network_u16) }

    /// Consume a big-endian `i16`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 2 bytes remain.
    pub fn i16(&mut self) -> Result<i16, DecodeError> { self.array().map(read_network_i16) }

    /// Consume a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 4 bytes remain.
    pub fn u32(&mut self) -> Result<u32, DecodeError> { self.array().map(read_network_u32) }

    /// Consume a big-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 8 bytes remain.
    pub fn u64(&mut self) -> Result<u64, DecodeError> { self.array().map(read_network_u64) }

    /// Consume a big-endian IEEE single.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 4 bytes remain.
    pub fn f32(&mut self) -> Result<f32, DecodeError> { self.array().map(read_network_f32) }

    /// Consume a big-endian IEEE double.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than 8 bytes remain.
    pub fn f64(&mut self) -> Result<f64, DecodeError> { self.array().map(read_network_f64) }

    fn advance<T>(&mut self, decoded: (T, usize)) -> T {
        self.pos += decoded.1;
        decoded.0
    }

    /// Consume an unsigned 32-bit VLQ.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the quantity is cut off.
    pub fn varuint32(&mut self) -> Result<u32, DecodeError> {
        let decoded = vlq::decode_varuint32(self.buf, self.pos)?;
        Ok(self.advance(decoded))
    }

    /// Consume a signed 32-bit VLQ.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the quantity is cut off.
    pub fn varint32(&mut self) -> Result<i32, DecodeError> {
        let decoded = vlq::decode_varint32(self.buf, self.pos)?;
        Ok(self.advance(decoded))
    }

    /// Consume an unsigned 64-bit VLQ.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the quantity is cut off.
    pub fn varuint64(&mut self) -> Result<u64, DecodeError> {
        let decoded = vlq::decode_varuint64(self.buf, self.pos)?;
        Ok(self.advance(decoded))
    }

    /// Consume a signed 64-bit VLQ.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when the quantity is cut off.
    pub fn varint64(&mut self) -> Result<i64, DecodeError> {
        let decoded = vlq::decode_varint64(self.buf, self.pos)?;
        Ok(self.advance(decoded))
    }

    /// Run `decode` one nesting level deeper.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DepthExceeded`] when the configured depth is
    /// already reached, or whatever `decode` returns.
    pub fn nested<T>(
        &mut self,
        decode: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let limit = self.config.max_depth.get();
        if self.depth >= limit {
            return Err(DecodeError::DepthExceeded {
                offset: self.pos,
                limit,
            });
        }
        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        result
    }

    /// Emit a label for the bytes from `start` to the current position.
    pub fn label(&mut self, start: usize, label: &dyn fmt::Display) {
        self.observer
            .on_label(Span::between(start, self.pos), label);
    }

    /// Record a non-fatal anomaly.
    pub fn record(&mut self, anomaly: Anomaly) {
        log::debug!("s7commp anomaly: {anomaly:?}");
        self.observer.on_anomaly(&anomaly);
        self.anomalies.push(anomaly);
    }

    /// Stop decoding the current scope at `start`, the first byte of the
    /// entry that failed with `error`.
    ///
    /// The error is recorded as an anomaly and the reader rewinds to `start`,
    /// so the failed entry and everything after it stay unread. Enclosing
    /// decoders check [`Reader::is_abandoned`] and return what they have.
    pub fn abandon(&mut self, start: usize, error: &DecodeError) {
        log::debug!("abandoning scope at offset {start}: {error}");
        if let Some(anomaly) = Anomaly::from_error(error) {
            self.record(anomaly);
        }
        self.seek(start);
        self.abandoned_at = self.abandoned_at.or(Some(self.pos));
    }

    /// Whether a scope was abandoned; nothing past it should be decoded.
    #[must_use]
    pub const fn is_abandoned(&self) -> bool { self.abandoned_at.is_some() }

    /// Drain the anomalies recorded so far.
    pub fn take_anomalies(&mut self) -> Vec<Anomaly> { std::mem::take(&mut self.anomalies) }
}
