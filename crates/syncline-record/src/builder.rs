//! Sync record builder
//!
//! Accumulates samples and events in arrival order during a session and
//! snapshots them into a `SessionSyncRecord`. The builder has no internal
//! locking: it is owned by the single loop driving the recording. Hosts that
//! push from several threads go through `SharedSink`.

use std::sync::Arc;

use parking_lot::Mutex;
use syncline_core::{
    ClockDomain, DiscreteEvent, Provenance, ReferenceTime, SessionId, StreamInfo, StreamSample,
};

use crate::{SessionSyncRecord, SyncMetadata};

/// One-method push interface for stamped events
pub trait EventSink {
    fn accept(&mut self, event: DiscreteEvent);
}

/// One-method push interface for collected samples
pub trait SampleSink {
    fn accept_sample(&mut self, sample: StreamSample);
}

/// Sync record builder
#[derive(Debug)]
pub struct SyncRecordBuilder {
    session_id: SessionId,
    session_start: ReferenceTime,
    reference_clock: ClockDomain,
    stream_info: Vec<StreamInfo>,
    samples: Vec<StreamSample>,
    events: Vec<DiscreteEvent>,
    fallback_events: usize,
}

impl SyncRecordBuilder {
    pub fn new(session_id: SessionId, session_start: ReferenceTime, reference_clock: ClockDomain) -> Self {
        tracing::debug!(session = %session_id, start = %session_start, clock = %reference_clock.name, "sync record opened");
        SyncRecordBuilder {
            session_id,
            session_start,
            reference_clock,
            stream_info: Vec::new(),
            samples: Vec::new(),
            events: Vec::new(),
            fallback_events: 0,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn session_start(&self) -> ReferenceTime {
        self.session_start
    }

    /// Register a stream attached to this session
    pub fn add_stream_info(&mut self, mut info: StreamInfo) {
        info.session_id = Some(self.session_id.clone());
        self.stream_info.push(info);
    }

    #[inline]
    pub fn append_sample(&mut self, sample: StreamSample) {
        self.samples.push(sample);
    }

    #[inline]
    pub fn append_event(&mut self, event: DiscreteEvent) {
        if event.provenance == Provenance::WallClockFallback {
            self.fallback_events += 1;
        }
        self.events.push(event);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn metadata(&self) -> SyncMetadata {
        SyncMetadata::describe(self.reference_clock.clone(), self.fallback_events)
    }

    /// Snapshot the current contents; the builder keeps accepting afterwards
    pub fn finalize(&self) -> SessionSyncRecord {
        SessionSyncRecord {
            session_id: self.session_id.clone(),
            session_start_reference_time: self.session_start,
            total_samples: self.samples.len(),
            stream_info: self.stream_info.clone(),
            sync_metadata: self.metadata(),
            streams: self.samples.clone(),
            events: self.events.clone(),
        }
    }

    /// Consume the builder into its record
    pub fn into_record(self) -> SessionSyncRecord {
        let sync_metadata = self.metadata();
        tracing::debug!(
            session = %self.session_id,
            samples = self.samples.len(),
            events = self.events.len(),
            "sync record finalized"
        );
        SessionSyncRecord {
            session_id: self.session_id,
            session_start_reference_time: self.session_start,
            total_samples: self.samples.len(),
            stream_info: self.stream_info,
            sync_metadata,
            streams: self.samples,
            events: self.events,
        }
    }
}

impl EventSink for SyncRecordBuilder {
    fn accept(&mut self, event: DiscreteEvent) {
        self.append_event(event);
    }
}

impl SampleSink for SyncRecordBuilder {
    fn accept_sample(&mut self, sample: StreamSample) {
        self.append_sample(sample);
    }
}

/// Builder behind a lock, for hosts that push from more than one thread
#[derive(Clone, Debug)]
pub struct SharedSink {
    inner: Arc<Mutex<SyncRecordBuilder>>,
}

impl SharedSink {
    pub fn new(builder: SyncRecordBuilder) -> Self {
        SharedSink {
            inner: Arc::new(Mutex::new(builder)),
        }
    }

    pub fn finalize(&self) -> SessionSyncRecord {
        self.inner.lock().finalize()
    }

    /// Run `f` with exclusive access to the builder
    pub fn with<R>(&self, f: impl FnOnce(&mut SyncRecordBuilder) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl EventSink for SharedSink {
    fn accept(&mut self, event: DiscreteEvent) {
        self.inner.lock().append_event(event);
    }
}

impl SampleSink for SharedSink {
    fn accept_sample(&mut self, sample: StreamSample) {
        self.inner.lock().append_sample(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use syncline_core::{Payload, StreamName};

    fn builder() -> SyncRecordBuilder {
        SyncRecordBuilder::new(
            SessionId::new("s1"),
            ReferenceTime(9.8),
            ClockDomain::new("reference_clock", true, "test"),
        )
    }

    fn sample(ts: f64) -> StreamSample {
        StreamSample::new(
            StreamName::new("EEG"),
            ReferenceTime(ts),
            ReferenceTime(9.8),
            Payload::Numeric(vec![ts]),
        )
    }

    fn event(ts: f64, provenance: Provenance) -> DiscreteEvent {
        DiscreteEvent::new("click", Map::new(), ReferenceTime(ts), provenance)
    }

    #[test]
    fn test_arrival_order_preserved() {
        let mut b = builder();
        b.append_sample(sample(10.02));
        b.append_sample(sample(10.0));
        b.append_event(event(10.5, Provenance::ReferenceClock));

        let record = b.finalize();
        assert_eq!(record.streams[0].reference_timestamp, ReferenceTime(10.02));
        assert_eq!(record.streams[1].reference_timestamp, ReferenceTime(10.0));
        assert_eq!(record.total_samples, 2);
        assert_eq!(record.events.len(), 1);
    }

    #[test]
    fn test_metadata_describes_sign_convention() {
        let record = builder().finalize();
        let meta = &record.sync_metadata;
        assert!(meta.clock_offset_type.contains("synchronized_time = source_timestamp + clock_offset"));
        assert_eq!(meta.anchor_event_types, vec!["video_recording_started".to_string()]);
        assert_eq!(meta.reference_clock.as_ref().unwrap().name, "reference_clock");
        assert!(!meta.is_degraded());
    }

    #[test]
    fn test_fallback_events_surface_in_metadata() {
        let mut b = builder();
        b.accept(event(1.0, Provenance::WallClockFallback));
        b.accept(event(2.0, Provenance::ReferenceClock));
        let meta = b.finalize().sync_metadata;
        assert_eq!(meta.fallback_event_count, 1);
        assert!(meta.is_degraded());
    }

    #[test]
    fn test_finalize_snapshot_then_keep_accepting() {
        let mut b = builder();
        b.append_sample(sample(10.0));
        let first = b.finalize();
        b.append_sample(sample(10.01));
        let second = b.into_record();

        assert_eq!(first.streams.len(), 1);
        assert_eq!(second.streams.len(), 2);
        assert_eq!(second.streams[0], first.streams[0]);
    }

    #[test]
    fn test_stream_info_bound_to_session() {
        let mut b = builder();
        b.add_stream_info(StreamInfo::new("EEG", "EEG", 8));
        let record = b.finalize();
        assert_eq!(record.stream_info[0].session_id, Some(SessionId::new("s1")));
    }

    #[test]
    fn test_shared_sink_across_threads() {
        let sink = SharedSink::new(builder());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mut sink = sink.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        sink.accept(event(i as f64 * 100.0 + j as f64, Provenance::ReferenceClock));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.finalize().events.len(), 100);
        assert_eq!(sink.with(|b| b.event_count()), 100);
    }
}
