//! Recording session runtime
//!
//! One tokio task drives a session: every selected stream is polled on its
//! own schedule, stamped events arrive over a bounded channel, and a watch
//! signal asks the loop to stop. On stop the queued events are drained, the
//! record is finalized and, when an output directory is configured, written
//! to disk together with the flat tracking record.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use syncline_core::{event_types, DiscreteEvent, RawEvent, ReferenceTime, SessionId};
use syncline_record::{EventSink, SessionSyncRecord, SyncRecordBuilder, TrackingLog};
use syncline_time::{
    select_sources, ClockSource, CollectorStats, EventTimestamper, OffsetSampleCollector,
    StreamSource,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::{RecorderConfig, RecorderError, RecorderResult};

/// Upper bound on one idle wait when nothing is scheduled
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Pulls per stream when emptying sources at stop
const FINAL_DRAIN_LIMIT: usize = 100_000;

/// Why a recording ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `RecorderHandle::stop` was called
    Requested,
    /// The surface sent `session_end` and the grace period elapsed
    SessionEnd,
    /// Every handle was dropped
    HandlesDropped,
}

/// Message on the intake channel
#[derive(Debug)]
enum Intake {
    Event(DiscreteEvent),
    SessionEnd,
}

/// Host-side handle: pushes events and stops the session
#[derive(Clone)]
pub struct RecorderHandle {
    session_id: SessionId,
    tx: mpsc::Sender<Intake>,
    stop_tx: Arc<watch::Sender<bool>>,
    stamper: Arc<EventTimestamper>,
    capacity: usize,
}

impl RecorderHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stamp and queue a surface event. `session_end` is not recorded; it
    /// ends the session after the configured grace period.
    pub fn push(&self, raw: RawEvent) -> RecorderResult<()> {
        if raw.is_session_end() {
            return self.send(Intake::SessionEnd);
        }
        let event = self.stamper.stamp(raw);
        self.send(Intake::Event(event))
    }

    /// Parse and queue a bridge message. Returns `Ok(false)` for messages
    /// that are not events (plain chat text and the like).
    pub fn push_message(&self, msg: &str) -> RecorderResult<bool> {
        match RawEvent::from_bridge_message(msg) {
            Some(raw) => self.push(raw).map(|()| true),
            None => {
                tracing::debug!(len = msg.len(), "bridge message is not an event");
                Ok(false)
            }
        }
    }

    /// Stamp and queue the anchor of a secondary timeline
    pub fn mark_anchor(&self, anchor_type: &str) -> RecorderResult<ReferenceTime> {
        let event = self.stamper.stamp_anchor(anchor_type, self.session_id.as_str());
        let at = event.reference_timestamp;
        self.send(Intake::Event(event))?;
        tracing::info!(session = %self.session_id, anchor_type, t = %at, "timeline anchor marked");
        Ok(at)
    }

    /// Anchor of the screen recording
    pub fn mark_video_start(&self) -> RecorderResult<ReferenceTime> {
        self.mark_anchor(event_types::VIDEO_RECORDING_STARTED)
    }

    /// Ask the recorder to stop. Events already queued are kept.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    fn send(&self, intake: Intake) -> RecorderResult<()> {
        self.tx.try_send(intake).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RecorderError::ChannelFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => RecorderError::Stopped,
        })
    }
}

impl EventSink for RecorderHandle {
    fn accept(&mut self, event: DiscreteEvent) {
        if let Err(e) = self.send(Intake::Event(event)) {
            tracing::warn!(session = %self.session_id, error = %e, "event rejected");
        }
    }
}

/// One stream and its poll schedule
struct ScheduledStream {
    source: Box<dyn StreamSource>,
    period: Duration,
    next_due: Instant,
}

impl ScheduledStream {
    /// Advance past `now`; polls missed while the loop was busy are skipped
    fn reschedule(&mut self, now: Instant) {
        self.next_due += self.period;
        if self.next_due <= now {
            self.next_due = now + self.period;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecorderStats {
    pub poll_rounds: u64,
    pub samples: u64,
    pub events: u64,
    pub drained_events: u64,
    /// Samples pulled from sources after the stop signal
    pub drained_samples: u64,
}

/// Outcome of one recording session
#[derive(Clone, Debug)]
pub struct RecordingSummary {
    pub record: SessionSyncRecord,
    pub stop_reason: StopReason,
    pub stats: RecorderStats,
    pub collector: CollectorStats,
    pub record_path: Option<PathBuf>,
    pub tracking_path: Option<PathBuf>,
    /// Set when writing the output failed; the record is still in memory
    pub persist_error: Option<String>,
}

impl RecordingSummary {
    /// Write the record (and optionally the tracking record) into `dir`
    pub fn save_to(&mut self, dir: &Path, config: &RecorderConfig) -> RecorderResult<()> {
        let record_path = dir.join(&config.record_file_name);
        self.record.save(&record_path)?;
        self.record_path = Some(record_path);

        if config.write_tracking {
            let tracking_path = dir.join(&config.tracking_file_name);
            TrackingLog::from_record(&self.record).save(&tracking_path)?;
            self.tracking_path = Some(tracking_path);
        }
        self.persist_error = None;
        Ok(())
    }
}

/// Recording session
pub struct Recorder {
    config: RecorderConfig,
    session_id: SessionId,
    collector: OffsetSampleCollector,
    stamper: Arc<EventTimestamper>,
    builder: SyncRecordBuilder,
    streams: Vec<ScheduledStream>,
    rx: mpsc::Receiver<Intake>,
    stop_rx: watch::Receiver<bool>,
    stats: RecorderStats,
}

impl Recorder {
    /// Prepare a session. The session start is the clock reading now; streams
    /// not matching the configured filters are dropped.
    pub fn new(
        config: RecorderConfig,
        clock: Arc<dyn ClockSource>,
        sources: Vec<Box<dyn StreamSource>>,
    ) -> RecorderResult<(Self, RecorderHandle)> {
        config.validate()?;
        let session_id = config.resolve_session_id();

        let sources = select_sources(sources, &config.stream_filters);
        if sources.is_empty() {
            tracing::warn!(session = %session_id, "no streams selected; recording events only");
        }

        let collector = OffsetSampleCollector::start_now(clock.clone())
            .with_marker_decoding(config.decode_markers);
        let mut builder =
            SyncRecordBuilder::new(session_id.clone(), collector.session_start(), clock.describe());

        let now = Instant::now();
        let streams = sources
            .into_iter()
            .map(|source| {
                builder.add_stream_info(source.info().clone());
                ScheduledStream {
                    period: config.poll_interval_for(&source.info().name),
                    next_due: now,
                    source,
                }
            })
            .collect();

        let stamper = Arc::new(EventTimestamper::new(clock));
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = RecorderHandle {
            session_id: session_id.clone(),
            tx,
            stop_tx: Arc::new(stop_tx),
            stamper: stamper.clone(),
            capacity: config.event_channel_capacity,
        };

        let recorder = Recorder {
            config,
            session_id,
            collector,
            stamper,
            builder,
            streams,
            rx,
            stop_rx,
            stats: RecorderStats::default(),
        };
        Ok((recorder, handle))
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Run on a new tokio task
    pub fn spawn(self) -> JoinHandle<RecordingSummary> {
        tokio::spawn(self.run())
    }

    /// Drive the session until stopped
    pub async fn run(mut self) -> RecordingSummary {
        let start_event = self.stamper.stamp(
            RawEvent::new(event_types::SESSION_START)
                .with_field("session_id", self.session_id.as_str())
                .with_field("stream_count", self.streams.len() as u64),
        );
        self.record_event(start_event);
        tracing::info!(
            session = %self.session_id,
            streams = self.streams.len(),
            start = %self.collector.session_start(),
            "recording started"
        );

        let grace = self.config.session_end_grace();
        let mut end_deadline: Option<Instant> = None;

        let stop_reason = loop {
            let wake = self.next_wake(end_deadline);

            tokio::select! {
                biased;

                changed = self.stop_rx.changed() => {
                    break match changed {
                        Ok(()) => StopReason::Requested,
                        Err(_) => StopReason::HandlesDropped,
                    };
                }

                intake = self.rx.recv() => match intake {
                    Some(Intake::Event(event)) => self.record_event(event),
                    Some(Intake::SessionEnd) => {
                        if end_deadline.is_none() {
                            tracing::info!(session = %self.session_id, grace_ms = grace.as_millis() as u64, "session_end received");
                            end_deadline = Some(Instant::now() + grace);
                        }
                    }
                    None => break StopReason::HandlesDropped,
                },

                _ = sleep_until(wake) => {
                    let now = Instant::now();
                    if end_deadline.map_or(false, |deadline| now >= deadline) {
                        break StopReason::SessionEnd;
                    }
                    self.poll_due(now);
                }
            }
        };

        self.finish(stop_reason).await
    }

    fn next_wake(&self, end_deadline: Option<Instant>) -> Instant {
        let next_poll = self
            .streams
            .iter()
            .map(|s| s.next_due)
            .min()
            .unwrap_or_else(|| Instant::now() + IDLE_WAIT);
        match end_deadline {
            Some(deadline) => next_poll.min(deadline),
            None => next_poll,
        }
    }

    /// Poll every stream that is due, once each
    fn poll_due(&mut self, now: Instant) {
        self.stats.poll_rounds += 1;
        for stream in self.streams.iter_mut().filter(|s| s.next_due <= now) {
            if let Some(sample) = self.collector.record_sample(stream.source.as_mut()) {
                self.builder.append_sample(sample);
                self.stats.samples += 1;
            }
            stream.reschedule(now);
        }
    }

    /// Pull whatever each source still holds. Bounded so a source that
    /// never runs dry cannot hold up shutdown.
    fn drain_streams(&mut self) {
        for stream in self.streams.iter_mut() {
            for _ in 0..FINAL_DRAIN_LIMIT {
                let Some(sample) = self.collector.record_sample(stream.source.as_mut()) else {
                    break;
                };
                self.builder.append_sample(sample);
                self.stats.samples += 1;
                self.stats.drained_samples += 1;
            }
        }
    }

    fn record_event(&mut self, event: DiscreteEvent) {
        self.builder.append_event(event);
        self.stats.events += 1;
    }

    async fn finish(mut self, stop_reason: StopReason) -> RecordingSummary {
        // Refuse new events, keep everything already queued
        self.rx.close();
        while let Some(intake) = self.rx.recv().await {
            if let Intake::Event(event) = intake {
                self.record_event(event);
                self.stats.drained_events += 1;
            }
        }
        self.drain_streams();

        let collector = self.collector.stats().clone();
        let record = self.builder.into_record();
        tracing::info!(
            session = %self.session_id,
            reason = ?stop_reason,
            samples = record.streams.len(),
            events = record.events.len(),
            source_errors = collector.source_errors,
            "recording stopped"
        );

        let mut summary = RecordingSummary {
            record,
            stop_reason,
            stats: self.stats,
            collector,
            record_path: None,
            tracking_path: None,
            persist_error: None,
        };

        if let Some(dir) = self.config.session_dir(&self.session_id) {
            if let Err(e) = summary.save_to(&dir, &self.config) {
                tracing::error!(session = %self.session_id, error = %e, dir = %dir.display(), "failed to write session output");
                summary.persist_error = Some(e.to_string());
            }
        }
        summary
    }
}
