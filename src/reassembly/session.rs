//! Per-capture bookkeeping that stitches fragments into telegrams.
//!
//! Fragments carry no markers. A segment whose header declares less data
//! than it actually holds ends with a trailer and closes a telegram; a
//! segment without a trailer opens or continues a run. Each connection
//! therefore keeps the state left by its previous segment, and each
//! decision is cached against the segment's identity so that revisiting a
//! segment replays the first decision instead of advancing the state.

use std::{
    collections::{HashMap, VecDeque, hash_map::Entry},
    num::NonZeroUsize,
};

use bytes::{BufMut, Bytes, BytesMut};

use super::{
    Classification,
    ConnectionId,
    ConnectionState,
    FragmentClass,
    Outcome,
    ReassemblyError,
    SegmentId,
    Telegram,
};
use crate::{
    config::{DecoderConfig, ReassemblyConfig},
    cursor::Reader,
    hooks::{DecodeObserver, NoopObserver},
    metrics,
    telegram::{HEADER_LEN, Header, PduType, decode_integrity_block},
};

#[derive(Debug)]
struct PartialRun {
    segments: Vec<SegmentId>,
    stripped_integrity: Vec<Bytes>,
    buffer: BytesMut,
}

impl PartialRun {
    fn new(anchor: SegmentId) -> Self {
        Self {
            segments: vec![anchor],
            stripped_integrity: Vec::new(),
            buffer: BytesMut::new(),
        }
    }

    fn len(&self) -> usize { self.buffer.len() }
}

#[derive(Clone, Copy, Debug)]
struct Decision {
    class: FragmentClass,
    anchor: Option<SegmentId>,
}

/// One segment split into the part that is buffered and the stripped
/// firmware 1.5 integrity block.
struct SegmentParts<'a> {
    header: Header,
    integrity: Option<&'a [u8]>,
    payload: &'a [u8],
}

/// Reassembly state for one analysis pass over a capture.
///
/// Connections are independent; segments of one connection must be fed in
/// arrival order.
///
/// Reassembled telegrams are kept, keyed by their last fragment, so that a
/// revisited last fragment yields its telegram again. At most
/// [`ReassemblyConfig::max_retained_telegrams`] are kept; the oldest goes
/// first, and revisiting its last fragment afterwards fails with
/// [`ReassemblyError::MissingRun`]. Classification decisions are small and
/// kept for the whole session.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: ReassemblyConfig,
    connections: HashMap<ConnectionId, ConnectionState>,
    decisions: HashMap<SegmentId, Decision>,
    runs: HashMap<SegmentId, PartialRun>,
    completed: HashMap<SegmentId, Telegram>,
    completed_order: VecDeque<SegmentId>,
}

impl AnalysisSession {
    /// Create a session with the default size cap.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a session with an explicit configuration.
    #[must_use]
    pub fn with_config(config: ReassemblyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// State the connection was left in by its last segment.
    #[must_use]
    pub fn state(&self, connection: ConnectionId) -> ConnectionState {
        self.connections
            .get(&connection)
            .copied()
            .unwrap_or_default()
    }

    /// Number of runs waiting for their last fragment.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.runs.len() }

    /// Number of reassembled telegrams kept for revisits.
    #[must_use]
    pub fn retained_len(&self) -> usize { self.completed.len() }

    /// Classify `segment` and either buffer it or hand back a telegram.
    ///
    /// # Errors
    ///
    /// See [`AnalysisSession::classify_with`].
    pub fn classify_and_maybe_buffer(
        &mut self,
        segment: &[u8],
        connection: ConnectionId,
        segment_id: SegmentId,
    ) -> Result<Classification, ReassemblyError> {
        self.classify_with(segment, connection, segment_id, &mut NoopObserver)
    }

    /// Classify `segment`, reporting the decision to `observer`.
    ///
    /// KeepAlive segments are delivered as they are and leave the
    /// connection state alone. A segment seen before replays its cached
    /// class: a replayed last fragment yields the same telegram again and
    /// replayed first or inner fragments are reported as buffered.
    ///
    /// A segment that fails ends the run it belongs to. Its connection goes
    /// back to [`ConnectionState::NoFragment`] and no decision is cached for
    /// it, so the next segment without a trailer opens a fresh run.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::NotThisProtocol`] for foreign segments,
    /// [`ReassemblyError::MessageTooLarge`] when a telegram would exceed
    /// the configured cap, [`ReassemblyError::MissingRun`] when an inner or
    /// last fragment has no run to join, and
    /// [`ReassemblyError::FragmentIntegrity`] when a firmware 1.5 fragment's
    /// integrity block is cut off.
    pub fn classify_with(
        &mut self,
        segment: &[u8],
        connection: ConnectionId,
        segment_id: SegmentId,
        observer: &mut dyn DecodeObserver,
    ) -> Result<Classification, ReassemblyError> {
        let header = Header::parse(segment)?;

        if header.pdu_type == PduType::KeepAlive {
            return Ok(Self::deliver_whole(segment, segment_id));
        }

        if let Some(decision) = self.decisions.get(&segment_id).copied() {
            log::debug!("replaying {} for segment {segment_id}", decision.class.as_str());
            observer.on_fragment(connection, segment_id, decision.class);
            return self.replay(segment, segment_id, decision);
        }

        let has_trailer = header.has_trailer(segment.len());
        let state = self.state(connection);
        let (class, next) = state.advance(has_trailer, segment_id);
        let anchor = match (state, class) {
            (ConnectionState::First { anchor } | ConnectionState::Inner { anchor }, _) => {
                Some(anchor)
            }
            (_, FragmentClass::First) => Some(segment_id),
            _ => None,
        };

        tracing::debug!(
            connection = %connection,
            segment = %segment_id,
            class = class.as_str(),
            len = segment.len(),
            "classified segment"
        );
        metrics::inc_segments(class);
        observer.on_fragment(connection, segment_id, class);

        let result = match (class, anchor) {
            (FragmentClass::First, Some(anchor)) => self.start_run(segment, anchor),
            (FragmentClass::Inner, Some(anchor)) => self.append(segment, segment_id, anchor),
            (FragmentClass::Last, Some(anchor)) => self.complete(segment, segment_id, anchor),
            _ => self
                .check_limit(segment_id, segment.len())
                .map(|()| Self::deliver_whole(segment, segment_id)),
        };
        match &result {
            Ok(_) => {
                self.connections.insert(connection, next);
                self.decisions.insert(segment_id, Decision { class, anchor });
            }
            Err(error) => {
                tracing::debug!(
                    connection = %connection,
                    segment = %segment_id,
                    %error,
                    "segment failed, connection back to no fragment"
                );
                self.connections.insert(connection, ConnectionState::NoFragment);
                if let Some(anchor) = anchor {
                    self.runs.remove(&anchor);
                }
            }
        }
        metrics::set_runs_buffered(self.runs.len());
        result
    }

    fn replay(
        &self,
        segment: &[u8],
        segment_id: SegmentId,
        decision: Decision,
    ) -> Result<Classification, ReassemblyError> {
        match decision.class {
            FragmentClass::NoFragment => Ok(Self::deliver_whole(segment, segment_id)),
            FragmentClass::First | FragmentClass::Inner => Ok(Classification {
                class: decision.class,
                outcome: Outcome::Buffered,
            }),
            FragmentClass::Last => {
                let telegram = self.completed.get(&segment_id).cloned().ok_or(
                    ReassemblyError::MissingRun {
                        anchor: decision.anchor.unwrap_or(segment_id),
                    },
                )?;
                Ok(Classification {
                    class: FragmentClass::Last,
                    outcome: Outcome::Deliverable(telegram),
                })
            }
        }
    }

    fn deliver_whole(segment: &[u8], segment_id: SegmentId) -> Classification {
        Classification {
            class: FragmentClass::NoFragment,
            outcome: Outcome::Deliverable(Telegram::new(
                Bytes::copy_from_slice(segment),
                vec![segment_id],
                Vec::new(),
            )),
        }
    }

    fn start_run(
        &mut self,
        segment: &[u8],
        anchor: SegmentId,
    ) -> Result<Classification, ReassemblyError> {
        let parts = split_segment(segment, anchor)?;
        self.check_limit(anchor, parts.payload.len())?;
        let mut run = PartialRun::new(anchor);
        if let Some(integrity) = parts.integrity {
            run.stripped_integrity.push(Bytes::copy_from_slice(integrity));
        }
        run.buffer.put_slice(parts.payload);
        self.runs.insert(anchor, run);
        Ok(Classification {
            class: FragmentClass::First,
            outcome: Outcome::Buffered,
        })
    }

    fn append(
        &mut self,
        segment: &[u8],
        segment_id: SegmentId,
        anchor: SegmentId,
    ) -> Result<Classification, ReassemblyError> {
        let parts = split_segment(segment, segment_id)?;
        self.push_parts(&parts, segment_id, anchor)?;
        Ok(Classification {
            class: FragmentClass::Inner,
            outcome: Outcome::Buffered,
        })
    }

    fn complete(
        &mut self,
        segment: &[u8],
        segment_id: SegmentId,
        anchor: SegmentId,
    ) -> Result<Classification, ReassemblyError> {
        let parts = split_segment(segment, segment_id)?;
        let header_integrity_len = parts.integrity.map_or(0, <[u8]>::len);
        self.push_parts(&parts, segment_id, anchor)?;
        let run = self
            .runs
            .remove(&anchor)
            .ok_or(ReassemblyError::MissingRun { anchor })?;

        let total = HEADER_LEN + header_integrity_len + run.len();
        let declared = u16::try_from(total.saturating_sub(2 * HEADER_LEN)).unwrap_or(u16::MAX);
        let mut bytes = BytesMut::with_capacity(total);
        bytes.put_slice(&Header::data(parts.header.pdu_type, declared).to_bytes());
        if let Some(integrity) = parts.integrity {
            bytes.put_slice(integrity);
        }
        bytes.put_slice(&run.buffer);

        let telegram = Telegram::new(bytes.freeze(), run.segments, run.stripped_integrity);
        log::debug!(
            "reassembled {} byte(s) from {} segment(s) anchored at {anchor}",
            telegram.len(),
            telegram.segments().len()
        );
        self.retain(segment_id, telegram.clone());
        Ok(Classification {
            class: FragmentClass::Last,
            outcome: Outcome::Deliverable(telegram),
        })
    }

    fn push_parts(
        &mut self,
        parts: &SegmentParts<'_>,
        segment_id: SegmentId,
        anchor: SegmentId,
    ) -> Result<(), ReassemblyError> {
        let limit = self.config.max_telegram_size;
        let Entry::Occupied(mut occupied) = self.runs.entry(anchor) else {
            log::warn!("segment {segment_id} continues run {anchor}, which is not buffered");
            return Err(ReassemblyError::MissingRun { anchor });
        };
        let attempted = occupied
            .get()
            .len()
            .checked_add(parts.payload.len())
            .unwrap_or(usize::MAX);
        if let Err(err) = assert_within_limit(limit, anchor, attempted) {
            occupied.remove();
            return Err(err);
        }
        let run = occupied.get_mut();
        run.segments.push(segment_id);
        if let Some(integrity) = parts.integrity {
            run.stripped_integrity.push(Bytes::copy_from_slice(integrity));
        }
        run.buffer.put_slice(parts.payload);
        Ok(())
    }

    fn retain(&mut self, segment_id: SegmentId, telegram: Telegram) {
        if self.completed.insert(segment_id, telegram).is_none() {
            self.completed_order.push_back(segment_id);
        }
        while self.completed.len() > self.config.max_retained_telegrams.get() {
            let Some(oldest) = self.completed_order.pop_front() else {
                break;
            };
            log::debug!("dropping reassembled telegram of segment {oldest}");
            self.completed.remove(&oldest);
        }
    }

    fn check_limit(&self, anchor: SegmentId, attempted: usize) -> Result<(), ReassemblyError> {
        assert_within_limit(self.config.max_telegram_size, anchor, attempted)
    }
}

fn assert_within_limit(
    limit: NonZeroUsize,
    anchor: SegmentId,
    attempted: usize,
) -> Result<(), ReassemblyError> {
    if attempted > limit.get() {
        log::warn!("run anchored at {anchor} reached {attempted} byte(s), limit {limit}");
        return Err(ReassemblyError::MessageTooLarge {
            anchor,
            attempted,
            limit,
        });
    }
    Ok(())
}

/// Split off the header and, for firmware 1.5, the integrity block behind
/// it. Everything else, trailer included, is payload.
fn split_segment(segment: &[u8], segment_id: SegmentId) -> Result<SegmentParts<'_>, ReassemblyError> {
    let header = Header::parse(segment)?;
    if !header.pdu_type.has_header_integrity() {
        return Ok(SegmentParts {
            header,
            integrity: None,
            payload: segment.get(HEADER_LEN..).unwrap_or_default(),
        });
    }
    let mut observer = NoopObserver;
    let mut reader = Reader::new(segment, HEADER_LEN, DecoderConfig::default(), &mut observer);
    decode_integrity_block(&mut reader, false).map_err(|source| {
        ReassemblyError::FragmentIntegrity {
            segment: segment_id,
            source,
        }
    })?;
    let end = reader.position();
    Ok(SegmentParts {
        header,
        integrity: segment.get(HEADER_LEN..end),
        payload: segment.get(end..).unwrap_or_default(),
    })
}
