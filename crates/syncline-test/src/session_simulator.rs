//! Session simulator - deterministic recordings without a runtime
//!
//! Drives a manual reference clock forward tick by tick, stamps scheduled
//! surface events at their exact instants and polls every stream once per
//! tick, the same way the recorder does in real time.

use std::sync::Arc;
use std::time::Duration;

use syncline_core::{event_types, RawEvent, ReferenceTime, SessionId, StreamInfo};
use syncline_record::{SessionSyncRecord, SyncRecordBuilder};
use syncline_time::{
    ClockSource, CollectorStats, EventTimestamper, ManualClock, OffsetSampleCollector, StreamSource,
};

use crate::time_simulator::{ClockDriftModel, SimulatedStream};

/// Simulated recording session
pub struct SessionSimulator {
    clock: Arc<ManualClock>,
    streams: Vec<Box<dyn StreamSource>>,
    collector: OffsetSampleCollector,
    stamper: EventTimestamper,
    builder: SyncRecordBuilder,
    tick: Duration,
    /// Pending events, kept sorted by due time
    scheduled: Vec<(ReferenceTime, RawEvent)>,
    seed_counter: u64,
}

impl SessionSimulator {
    /// Start a session at reference time `start` (seconds)
    pub fn new(session_id: impl Into<SessionId>, start: f64, tick: Duration) -> Self {
        Self::with_clock(session_id, Arc::new(ManualClock::new(start)), tick)
    }

    /// Start a session on a caller-supplied manual clock
    pub fn with_clock(session_id: impl Into<SessionId>, clock: Arc<ManualClock>, tick: Duration) -> Self {
        let dyn_clock: Arc<dyn ClockSource> = clock.clone();
        let collector = OffsetSampleCollector::start_now(dyn_clock.clone());
        let builder = SyncRecordBuilder::new(session_id.into(), collector.session_start(), dyn_clock.describe());
        SessionSimulator {
            clock,
            streams: Vec::new(),
            collector,
            stamper: EventTimestamper::new(dyn_clock),
            builder,
            tick,
            scheduled: Vec::new(),
            seed_counter: 0,
        }
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        self.clock.clone()
    }

    pub fn session_start(&self) -> ReferenceTime {
        self.collector.session_start()
    }

    /// Add a drifting device stream
    pub fn add_stream(&mut self, info: StreamInfo, drift: ClockDriftModel, rate_hz: f64) {
        let seed = self.seed_counter;
        self.seed_counter += 1;
        let stream = SimulatedStream::new(info, self.clock.clone(), drift, rate_hz, seed);
        self.add_source(Box::new(stream));
    }

    pub fn add_source(&mut self, source: Box<dyn StreamSource>) {
        self.builder.add_stream_info(source.info().clone());
        self.streams.push(source);
    }

    /// Schedule an event `after` seconds past the session start
    pub fn schedule_event(&mut self, after: f64, event: RawEvent) {
        let at = self.session_start().offset_by(after);
        let pos = self
            .scheduled
            .partition_point(|(t, _)| t.total_cmp(&at).is_le());
        self.scheduled.insert(pos, (at, event));
    }

    /// Schedule the screen-recording anchor
    pub fn schedule_video_start(&mut self, after: f64) {
        let event = RawEvent::new(event_types::VIDEO_RECORDING_STARTED)
            .with_field("session_id", self.builder.session_id().as_str());
        self.schedule_event(after, event);
    }

    /// Advance the session by `duration`
    pub fn run(&mut self, duration: Duration) {
        let ticks = (duration.as_micros() / self.tick.as_micros().max(1)) as u64;
        for _ in 0..ticks {
            self.step();
        }
    }

    fn step(&mut self) {
        let tick_end = self.clock.now().offset_by(self.tick.as_secs_f64());

        let due = self
            .scheduled
            .partition_point(|(t, _)| t.total_cmp(&tick_end).is_le());
        for (at, raw) in self.scheduled.drain(..due) {
            self.clock.set(at.as_secs_f64());
            self.builder.append_event(self.stamper.stamp(raw));
        }

        self.clock.set(tick_end.as_secs_f64());
        for sample in self.collector.poll_all(&mut self.streams) {
            self.builder.append_sample(sample);
        }
    }

    pub fn collector_stats(&self) -> &CollectorStats {
        self.collector.stats()
    }

    /// Snapshot of the record so far
    pub fn record(&self) -> SessionSyncRecord {
        self.builder.finalize()
    }

    pub fn finish(self) -> SessionSyncRecord {
        self.builder.into_record()
    }
}

/// Predefined sessions
pub mod scenarios {
    use super::*;

    /// Lab session: a fast EEG headset, a slow wearable and a marker stream,
    /// with the screen recording starting 80.8s in (at reference 680.8)
    pub fn lab_session(duration: Duration) -> SessionSimulator {
        let mut sim = SessionSimulator::new("lab", 600.0, Duration::from_millis(2));
        sim.add_stream(StreamInfo::new("EEG", "EEG", 8), ClockDriftModel::fast(), 250.0);
        sim.add_stream(
            StreamInfo::new("EmotiBit", "PPG", 3),
            ClockDriftModel::slow(),
            25.0,
        );
        sim.schedule_video_start(80.8);
        sim.schedule_event(79.0, RawEvent::new("page_loaded"));
        sim.schedule_event(85.0, RawEvent::new("button_click").with_field("id", "next"));
        sim.run(duration);
        sim
    }

    /// Devices whose hosts cannot measure offsets
    pub fn unmeasured_pair(duration: Duration) -> SessionSimulator {
        let mut sim = SessionSimulator::new("unmeasured", 10.0, Duration::from_millis(5));
        let clock = sim.clock();
        for (i, name) in ["Left", "Right"].iter().enumerate() {
            let stream = SimulatedStream::new(
                StreamInfo::new(*name, "EEG", 1),
                clock.clone(),
                ClockDriftModel::perfect(),
                50.0,
                i as u64,
            )
            .without_offset();
            sim.add_source(Box::new(stream));
        }
        sim.schedule_video_start(0.5);
        sim.run(duration);
        sim
    }

    /// A noisy device next to a stable one
    pub fn noisy_and_stable(duration: Duration) -> SessionSimulator {
        let mut sim = SessionSimulator::new("noisy", 0.0, Duration::from_millis(5));
        sim.add_stream(StreamInfo::new("Stable", "EEG", 1), ClockDriftModel::perfect(), 100.0);
        sim.add_stream(StreamInfo::new("Noisy", "EEG", 1), ClockDriftModel::unstable(), 100.0);
        sim.run(duration);
        sim
    }
}
