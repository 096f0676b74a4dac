//! Offset sample collector
//!
//! Pulls at most one sample per stream per tick and stamps it in the
//! reference domain together with the stream's current clock offset.
//! Nothing here blocks: an empty poll is the common case and yields `None`.

use std::sync::Arc;

use syncline_core::{
    Payload, ReferenceTime, StreamInfo, StreamName, StreamSample, SyncError, SyncResult,
};

use crate::ClockSource;

/// A payload pulled from a continuous source
#[derive(Clone, Debug, PartialEq)]
pub struct PulledSample {
    pub payload: Payload,
    /// Timestamp reported by the source, if it already lives in the
    /// reference domain
    pub timestamp: Option<ReferenceTime>,
}

impl PulledSample {
    pub fn new(payload: Payload) -> Self {
        PulledSample {
            payload,
            timestamp: None,
        }
    }

    pub fn at(payload: Payload, timestamp: ReferenceTime) -> Self {
        PulledSample {
            payload,
            timestamp: Some(timestamp),
        }
    }
}

/// Upstream interface of a continuous stream
///
/// Both primitives must be non-blocking.
pub trait StreamSource: Send {
    fn info(&self) -> &StreamInfo;

    /// Pull the next available sample with a zero timeout.
    /// `Ok(None)` means nothing is available yet.
    fn pull_sample(&mut self) -> SyncResult<Option<PulledSample>>;

    /// Current estimate of (source clock - reference clock), seconds.
    /// `None` when the source has no meaningful offset (e.g. local origin).
    fn time_correction(&mut self) -> Option<f64>;
}

/// Keep only the sources whose name matches one of `filters`
/// (case-insensitive exact or substring match; empty filters keep all)
pub fn select_sources<S: AsRef<str>>(
    sources: Vec<Box<dyn StreamSource>>,
    filters: &[S],
) -> Vec<Box<dyn StreamSource>> {
    sources
        .into_iter()
        .filter(|s| s.info().name.matches_any(filters))
        .collect()
}

/// Collector statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub polls: u64,
    pub samples: u64,
    pub empty_polls: u64,
    pub source_errors: u64,
    pub unmeasured_offsets: u64,
}

/// Offset sample collector
pub struct OffsetSampleCollector {
    /// Reference clock
    clock: Arc<dyn ClockSource>,
    /// Session zero point in the reference domain
    session_start: ReferenceTime,
    /// Decode JSON marker strings into structured payloads
    decode_markers: bool,
    stats: CollectorStats,
}

impl OffsetSampleCollector {
    pub fn new(clock: Arc<dyn ClockSource>, session_start: ReferenceTime) -> Self {
        OffsetSampleCollector {
            clock,
            session_start,
            decode_markers: true,
            stats: CollectorStats::default(),
        }
    }

    /// Start a session at the clock's current reading
    pub fn start_now(clock: Arc<dyn ClockSource>) -> Self {
        let start = clock.now();
        Self::new(clock, start)
    }

    pub fn with_marker_decoding(mut self, enabled: bool) -> Self {
        self.decode_markers = enabled;
        self
    }

    pub fn session_start(&self) -> ReferenceTime {
        self.session_start
    }

    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    /// Pull one sample from `source`.
    ///
    /// Returns `None` when nothing is available or the source failed; a
    /// failing source is logged and skipped, never propagated into the
    /// recording loop.
    pub fn record_sample(&mut self, source: &mut dyn StreamSource) -> Option<StreamSample> {
        self.stats.polls += 1;

        let pulled = match source.pull_sample() {
            Ok(Some(pulled)) => pulled,
            Ok(None) => {
                self.stats.empty_polls += 1;
                return None;
            }
            Err(e) => {
                self.stats.source_errors += 1;
                tracing::warn!(stream = %source.info().name, error = %e, "stream poll failed");
                return None;
            }
        };
        let pulled_at = self.clock.now();

        let offset = source.time_correction();
        let measured_at = offset.map(|_| self.clock.now());
        if offset.is_none() {
            self.stats.unmeasured_offsets += 1;
        }

        let info = source.info();
        let reference_timestamp = pulled.timestamp.unwrap_or(pulled_at);
        let mut sample = StreamSample::new(
            info.name.clone(),
            reference_timestamp,
            self.session_start,
            pulled.payload,
        );
        if !info.stream_type.is_empty() {
            sample.stream_type = Some(info.stream_type.clone());
        }
        sample.clock_offset = offset;
        sample.offset_measured_at = measured_at;

        if self.decode_markers {
            if let Some((structured, raw)) = sample.payload.parse_structured() {
                sample.payload = structured;
                sample.raw_payload = Some(raw);
            }
        }

        self.stats.samples += 1;
        Some(sample)
    }

    /// Poll every source once, in order. Missed polls are not retried.
    pub fn poll_all(&mut self, sources: &mut [Box<dyn StreamSource>]) -> Vec<StreamSample> {
        let mut out = Vec::new();
        for source in sources.iter_mut() {
            if let Some(sample) = self.record_sample(source.as_mut()) {
                out.push(sample);
            }
        }
        out
    }
}

/// In-memory source fed by the host, for streams that originate locally
/// (e.g. cursor position sampled by the host itself)
pub struct LocalStreamSource {
    info: StreamInfo,
    pending: std::collections::VecDeque<PulledSample>,
    offset: Option<f64>,
}

impl LocalStreamSource {
    pub fn new(info: StreamInfo) -> Self {
        LocalStreamSource {
            info,
            pending: std::collections::VecDeque::new(),
            offset: None,
        }
    }

    /// Report a constant offset instead of "no meaningful offset"
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn push(&mut self, sample: PulledSample) {
        self.pending.push_back(sample);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl StreamSource for LocalStreamSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_sample(&mut self) -> SyncResult<Option<PulledSample>> {
        Ok(self.pending.pop_front())
    }

    fn time_correction(&mut self) -> Option<f64> {
        self.offset
    }
}

/// Source that always fails; stands in for a closed inlet
pub struct ClosedStreamSource {
    info: StreamInfo,
}

impl ClosedStreamSource {
    pub fn new(info: StreamInfo) -> Self {
        ClosedStreamSource { info }
    }
}

impl StreamSource for ClosedStreamSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_sample(&mut self) -> SyncResult<Option<PulledSample>> {
        Err(SyncError::SourceFailed {
            stream: self.info.name.to_string(),
            reason: "stream closed".to_string(),
        })
    }

    fn time_correction(&mut self) -> Option<f64> {
        None
    }
}

/// Name of a stream, convenient for filtering recorded samples
pub fn stream_name(source: &dyn StreamSource) -> &StreamName {
    &source.info().name
}
