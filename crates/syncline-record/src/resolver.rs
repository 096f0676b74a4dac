//! Timeline resolver
//!
//! Offline analysis: given a finalized record and a secondary timeline (a
//! screen recording, say), find the timeline's anchor event and express every
//! sample and event relative to it.
//!
//! The resolver works purely from recorded fields. It never reads a clock,
//! so resolving the same record twice gives the same answer.

use std::cmp::Ordering;

use syncline_core::{
    DiscreteEvent, Provenance, ReferenceTime, SecondaryTimeline, SessionId, StreamSample,
    SyncAnchor, SyncError, SyncResult, TimelinePosition,
};

use crate::SessionSyncRecord;

/// A recorded entity placed on a timeline
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Sample(StreamSample),
    Event(DiscreteEvent),
}

impl Entity {
    #[inline]
    pub fn reference_timestamp(&self) -> ReferenceTime {
        match self {
            Entity::Sample(s) => s.reference_timestamp,
            Entity::Event(e) => e.reference_timestamp,
        }
    }

    /// Stream name for samples, event type for events
    pub fn label(&self) -> &str {
        match self {
            Entity::Sample(s) => s.stream_name.as_str(),
            Entity::Event(e) => &e.event_type,
        }
    }

    pub fn as_sample(&self) -> Option<&StreamSample> {
        match self {
            Entity::Sample(s) => Some(s),
            Entity::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&DiscreteEvent> {
        match self {
            Entity::Event(e) => Some(e),
            Entity::Sample(_) => None,
        }
    }

    /// Samples sort before events at equal timestamps
    fn tie_rank(&self) -> u8 {
        match self {
            Entity::Sample(_) => 0,
            Entity::Event(_) => 1,
        }
    }

    /// Clock domain of the timestamp. Samples are always in the reference
    /// domain; only events can be stamped from the wall-clock fallback.
    pub fn provenance(&self) -> Provenance {
        match self {
            Entity::Sample(_) => Provenance::ReferenceClock,
            Entity::Event(e) => e.provenance,
        }
    }
}

/// One entity with its secondary-timeline coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEntry {
    pub entity: Entity,
    /// `reference_timestamp - anchor`
    pub resolved_time: f64,
    /// `reference_timestamp + clock_offset - anchor`, for samples with a
    /// measured offset
    pub corrected_time: Option<f64>,
    pub position: TimelinePosition,
    /// False when the entity and the anchor were stamped from different
    /// clocks; `resolved_time` is then meaningless
    pub alignable: bool,
}

impl ResolvedEntry {
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.position.is_visible()
    }

    /// Video frame showing this entry
    pub fn frame_index(&self, fps: f64, frame_count: u64) -> Option<u64> {
        frame_index(self.resolved_time, fps, frame_count)
    }

    /// `(x, y)` of a position sample: the first two numeric channels
    pub fn pointer_position(&self) -> Option<(f64, f64)> {
        match self.entity.as_sample()?.payload.as_numeric()? {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        }
    }
}

/// Frame of a video shown at `resolved_time` seconds after its anchor.
///
/// `floor(resolved_time * fps)`, clamped to `[0, frame_count - 1]`. `None`
/// for an empty video, a non-positive frame rate or a NaN time.
pub fn frame_index(resolved_time: f64, fps: f64, frame_count: u64) -> Option<u64> {
    if frame_count == 0 || !fps.is_finite() || fps <= 0.0 || resolved_time.is_nan() {
        return None;
    }
    let frame = (resolved_time * fps).floor();
    let last = frame_count - 1;
    if frame <= 0.0 {
        Some(0)
    } else if frame >= last as f64 {
        Some(last)
    } else {
        Some(frame as u64)
    }
}

/// Every entity of a record, ordered and expressed relative to one anchor
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTimeline {
    pub session_id: SessionId,
    pub timeline: SecondaryTimeline,
    pub anchor: SyncAnchor,
    pub entries: Vec<ResolvedEntry>,
}

impl ResolvedTimeline {
    /// The anchor itself came from the wall-clock fallback
    pub fn is_degraded(&self) -> bool {
        !self.anchor.is_alignable()
    }

    /// Entries whose resolved time cannot be trusted
    pub fn unalignable(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| !e.alignable)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries inside the secondary timeline
    pub fn visible(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| e.is_visible())
    }

    /// Entries that occurred before the secondary timeline started
    pub fn before_anchor(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries
            .iter()
            .filter(|e| e.position == TimelinePosition::BeforeAnchor)
    }

    pub fn events(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| matches!(e.entity, Entity::Event(_)))
    }

    /// Samples of one stream, in timeline order
    pub fn samples_of<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a ResolvedEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.entity.as_sample().map_or(false, |s| s.stream_name == stream))
    }

    /// Sample of `stream` closest to `resolved_time`; the earlier one wins a tie
    pub fn nearest_sample<'a>(&'a self, stream: &'a str, resolved_time: f64) -> Option<&'a ResolvedEntry> {
        let mut best: Option<(&ResolvedEntry, f64)> = None;
        for entry in self.samples_of(stream) {
            let diff = (entry.resolved_time - resolved_time).abs();
            if diff.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((entry, diff));
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Samples of `stream` within `[resolved_time - duration, resolved_time]`.
    /// The window never reaches before the anchor.
    pub fn samples_in_window<'a>(
        &'a self,
        stream: &'a str,
        resolved_time: f64,
        duration: f64,
    ) -> impl Iterator<Item = &'a ResolvedEntry> + 'a {
        let start = (resolved_time - duration).max(0.0);
        self.samples_of(stream)
            .filter(move |e| e.resolved_time >= start && e.resolved_time <= resolved_time)
    }

    /// Pointer position nearest to `resolved_time`
    pub fn pointer_at(&self, stream: &str, resolved_time: f64) -> Option<(f64, f64)> {
        self.nearest_sample(stream, resolved_time)?.pointer_position()
    }

    /// Pointer positions over the `duration` seconds up to `resolved_time`
    pub fn pointer_trail(&self, stream: &str, resolved_time: f64, duration: f64) -> Vec<(f64, f64)> {
        self.samples_in_window(stream, resolved_time, duration)
            .filter_map(ResolvedEntry::pointer_position)
            .collect()
    }

    pub fn samples(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter().filter(|e| matches!(e.entity, Entity::Sample(_)))
    }
}

/// Resolver configuration
#[derive(Clone, Debug)]
pub struct TimelineResolver {
    /// Also consider events carried inside marker-stream samples
    pub include_marker_events: bool,
}

impl Default for TimelineResolver {
    fn default() -> Self {
        Self {
            include_marker_events: true,
        }
    }
}

impl TimelineResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that only looks at directly recorded events
    pub fn direct_events_only() -> Self {
        Self {
            include_marker_events: false,
        }
    }

    fn collect_events(&self, record: &SessionSyncRecord) -> Vec<DiscreteEvent> {
        if self.include_marker_events {
            record.all_events()
        } else {
            record.events.clone()
        }
    }

    /// Locate the single anchor of `timeline` among `events`
    pub fn find_anchor(
        &self,
        events: &[DiscreteEvent],
        timeline: &SecondaryTimeline,
    ) -> SyncResult<SyncAnchor> {
        let mut anchors = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_anchor_for(timeline));

        let Some((event_index, anchor)) = anchors.next() else {
            return Err(SyncError::AnchorNotFound {
                anchor_type: timeline.anchor_type.clone(),
            });
        };
        let extra = anchors.count();
        if extra > 0 {
            return Err(SyncError::AmbiguousAnchor {
                anchor_type: timeline.anchor_type.clone(),
                count: extra + 1,
            });
        }
        Ok(SyncAnchor {
            event_index,
            reference_timestamp: anchor.reference_timestamp,
            provenance: anchor.provenance,
        })
    }

    /// Resolve every sample and event of `record` against `timeline`.
    ///
    /// Fails without any partial output when the anchor is missing or
    /// ambiguous. Entries are sorted by reference timestamp; ties keep
    /// samples before events, then record order.
    pub fn resolve(
        &self,
        record: &SessionSyncRecord,
        timeline: &SecondaryTimeline,
    ) -> SyncResult<ResolvedTimeline> {
        let events = self.collect_events(record);
        let anchor = self.find_anchor(&events, timeline)?;
        let zero = anchor.reference_timestamp;
        if !anchor.is_alignable() {
            tracing::warn!(
                session = %record.session_id,
                timeline = %timeline.name,
                "anchor stamped from the wall clock; reference-clock entries cannot be aligned"
            );
        }

        let mut entities: Vec<Entity> = Vec::with_capacity(record.streams.len() + events.len());
        entities.extend(record.streams.iter().cloned().map(Entity::Sample));
        entities.extend(events.into_iter().map(Entity::Event));
        // Stable sort: equal keys keep insertion order
        entities.sort_by(|a, b| compare_entities(a, b));

        let entries: Vec<ResolvedEntry> = entities
            .into_iter()
            .map(|entity| {
                let resolved_time = entity.reference_timestamp() - zero;
                let corrected_time = entity
                    .as_sample()
                    .and_then(StreamSample::corrected_timestamp)
                    .map(|corrected| corrected - zero);
                ResolvedEntry {
                    position: TimelinePosition::classify(resolved_time),
                    alignable: entity.provenance() == anchor.provenance,
                    entity,
                    resolved_time,
                    corrected_time,
                }
            })
            .collect();

        tracing::debug!(
            session = %record.session_id,
            timeline = %timeline.name,
            anchor = %zero,
            entries = entries.len(),
            "timeline resolved"
        );

        Ok(ResolvedTimeline {
            session_id: record.session_id.clone(),
            timeline: timeline.clone(),
            anchor,
            entries,
        })
    }

    /// Resolve many records. A record that fails to resolve is reported in
    /// its slot and does not affect the others.
    pub fn resolve_batch<'a, I>(
        &self,
        records: I,
        timeline: &SecondaryTimeline,
    ) -> Vec<(SessionId, SyncResult<ResolvedTimeline>)>
    where
        I: IntoIterator<Item = &'a SessionSyncRecord>,
    {
        records
            .into_iter()
            .map(|record| {
                let result = self.resolve(record, timeline);
                if let Err(e) = &result {
                    tracing::warn!(session = %record.session_id, error = %e, "record skipped");
                }
                (record.session_id.clone(), result)
            })
            .collect()
    }
}

fn compare_entities(a: &Entity, b: &Entity) -> Ordering {
    a.reference_timestamp()
        .total_cmp(&b.reference_timestamp())
        .then_with(|| a.tie_rank().cmp(&b.tie_rank()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncRecordBuilder;
    use proptest::prelude::*;
    use serde_json::{json, Map};
    use syncline_core::{event_types, ClockDomain, Payload, StreamName};

    const START: f64 = 600.0;

    fn builder() -> SyncRecordBuilder {
        SyncRecordBuilder::new(
            SessionId::new("s"),
            ReferenceTime(START),
            ClockDomain::new("reference_clock", true, "test"),
        )
    }

    fn sample(name: &str, ts: f64) -> StreamSample {
        StreamSample::new(
            StreamName::new(name),
            ReferenceTime(ts),
            ReferenceTime(START),
            Payload::Numeric(vec![ts]),
        )
    }

    fn event(event_type: &str, ts: f64) -> DiscreteEvent {
        DiscreteEvent::new(event_type, Map::new(), ReferenceTime(ts), Provenance::ReferenceClock)
    }

    fn anchored_record() -> SessionSyncRecord {
        let mut b = builder();
        b.append_sample(sample("EEG", 679.0));
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 680.8));
        b.append_sample(sample("EEG", 681.0).with_offset(0.25, ReferenceTime(681.0)));
        b.append_event(event("button_click", 682.3));
        b.into_record()
    }

    #[test]
    fn test_sample_before_anchor_is_negative() {
        let timeline = TimelineResolver::new()
            .resolve(&anchored_record(), &SecondaryTimeline::video())
            .unwrap();

        let first = &timeline.entries[0];
        assert!((first.resolved_time - (-1.8)).abs() < 1e-9);
        assert_eq!(first.position, TimelinePosition::BeforeAnchor);
        assert!(!first.is_visible());
        assert_eq!(timeline.before_anchor().count(), 1);
    }

    #[test]
    fn test_anchor_resolves_to_zero() {
        let timeline = TimelineResolver::new()
            .resolve(&anchored_record(), &SecondaryTimeline::video())
            .unwrap();

        let anchor = timeline
            .entries
            .iter()
            .find(|e| e.entity.label() == event_types::VIDEO_RECORDING_STARTED)
            .unwrap();
        assert_eq!(anchor.resolved_time, 0.0);
        assert_eq!(anchor.position, TimelinePosition::AtAnchor);
        assert_eq!(timeline.anchor.reference_timestamp, ReferenceTime(680.8));
        assert_eq!(timeline.anchor.event_index, 0);
    }

    #[test]
    fn test_corrected_time_only_with_offset() {
        let timeline = TimelineResolver::new()
            .resolve(&anchored_record(), &SecondaryTimeline::video())
            .unwrap();

        let samples: Vec<_> = timeline.samples().collect();
        assert!(samples[0].corrected_time.is_none());
        let corrected = samples[1].corrected_time.unwrap();
        assert!((corrected - (681.0 + 0.25 - 680.8)).abs() < 1e-9);
        assert!((samples[1].resolved_time - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_anchor() {
        let mut b = builder();
        b.append_sample(sample("EEG", 601.0));
        let err = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap_err();
        assert!(matches!(err, SyncError::AnchorNotFound { .. }));
        assert!(err.is_anchor_error());
    }

    #[test]
    fn test_two_anchors_are_ambiguous() {
        let mut b = builder();
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 601.0));
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 602.0));
        let err = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap_err();
        assert!(matches!(err, SyncError::AmbiguousAnchor { count: 2, .. }));
    }

    #[test]
    fn test_ties_put_samples_before_events_then_record_order() {
        let mut b = builder();
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 610.0));
        b.append_event(event("a", 605.0));
        b.append_sample(sample("first", 605.0));
        b.append_event(event("b", 605.0));
        b.append_sample(sample("second", 605.0));

        let timeline = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap();
        let labels: Vec<&str> = timeline.entries.iter().map(|e| e.entity.label()).collect();
        assert_eq!(
            labels,
            vec!["first", "second", "a", "b", event_types::VIDEO_RECORDING_STARTED]
        );
    }

    #[test]
    fn test_fallback_events_marked_unalignable() {
        let mut b = builder();
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 610.0));
        b.append_event(DiscreteEvent::new(
            "click",
            Map::new(),
            ReferenceTime(1_700_000_000.0),
            Provenance::WallClockFallback,
        ));
        let timeline = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap();
        let click = timeline.events().find(|e| e.entity.label() == "click").unwrap();
        assert!(!click.alignable);
    }

    #[test]
    fn test_fallback_anchor_flags_reference_entries() {
        let mut b = builder();
        b.append_sample(sample("EEG", 605.0));
        b.append_event(DiscreteEvent::new(
            event_types::VIDEO_RECORDING_STARTED,
            Map::new(),
            ReferenceTime(1_700_000_000.0),
            Provenance::WallClockFallback,
        ));
        b.append_event(DiscreteEvent::new(
            "click",
            Map::new(),
            ReferenceTime(1_700_000_002.0),
            Provenance::WallClockFallback,
        ));
        let timeline = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap();

        assert!(timeline.is_degraded());
        let eeg = timeline.samples().next().unwrap();
        assert!(!eeg.alignable);
        let click = timeline.events().find(|e| e.entity.label() == "click").unwrap();
        assert!(click.alignable);
        assert!((click.resolved_time - 2.0).abs() < 1e-9);
        assert_eq!(timeline.unalignable().count(), 1);
    }

    #[test]
    fn test_marker_echo_of_direct_anchor_is_not_ambiguous() {
        let mut b = builder();
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 605.0));
        b.append_event(event("button_click", 606.0));
        let mut echo = sample("MadsPipeline_BridgeEvents", 605.0);
        echo.payload = Payload::Text(r#"{"type":"video_recording_started"}"#.into())
            .parse_structured()
            .unwrap()
            .0;
        b.append_sample(echo);
        let mut click_echo = sample("MadsPipeline_BridgeEvents", 606.002);
        click_echo.payload = Payload::Text(r#"{"type":"button_click"}"#.into())
            .parse_structured()
            .unwrap()
            .0;
        b.append_sample(click_echo);
        let mut page = sample("MadsPipeline_BridgeEvents", 604.0);
        page.payload = Payload::Text(r#"{"type":"page_loaded"}"#.into())
            .parse_structured()
            .unwrap()
            .0;
        b.append_sample(page);

        let timeline = TimelineResolver::new()
            .resolve(&b.into_record(), &SecondaryTimeline::video())
            .unwrap();
        assert_eq!(timeline.anchor.reference_timestamp, ReferenceTime(605.0));
        assert!(!timeline.is_degraded());
        let event_labels: Vec<&str> = timeline.events().map(|e| e.entity.label()).collect();
        assert_eq!(
            event_labels,
            vec!["page_loaded", event_types::VIDEO_RECORDING_STARTED, "button_click"]
        );
    }

    #[test]
    fn test_anchor_from_marker_stream() {
        let record = SessionSyncRecord::from_value(json!({
            "session_id": "legacy",
            "session_start_time": 9.8,
            "lsl_samples": [
                {"timestamp": 10.0, "stream_name": "MadsPipeline_MouseTracking", "data": [0.5, 0.5, 0.0]},
                {"timestamp": 10.5, "stream_name": "MadsPipeline_BridgeEvents",
                 "data": {"type": "video_recording_started", "data": {"lsl_timestamp": 10.5}}}
            ]
        }))
        .unwrap();

        let timeline = TimelineResolver::new()
            .resolve(&record, &SecondaryTimeline::video())
            .unwrap();
        assert_eq!(timeline.anchor.reference_timestamp, ReferenceTime(10.5));
        assert!((timeline.entries[0].resolved_time - (-0.5)).abs() < 1e-9);

        let err = TimelineResolver::direct_events_only()
            .resolve(&record, &SecondaryTimeline::video())
            .unwrap_err();
        assert!(matches!(err, SyncError::AnchorNotFound { .. }));
    }

    fn pointer_record() -> SessionSyncRecord {
        let mut b = builder();
        b.append_sample(sample("EEG", 610.4));
        for (i, t) in [609.5, 610.0, 610.5, 611.0, 612.0].iter().enumerate() {
            let mut s = sample("Mouse", *t);
            s.payload = Payload::Numeric(vec![i as f64 * 10.0, 5.0, 3.0]);
            b.append_sample(s);
        }
        b.append_event(event(event_types::VIDEO_RECORDING_STARTED, 610.0));
        b.into_record()
    }

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index(0.0, 30.0, 100), Some(0));
        assert_eq!(frame_index(1.0, 30.0, 100), Some(30));
        assert_eq!(frame_index(1.0499, 30.0, 100), Some(31));
        assert_eq!(frame_index(-1.8, 30.0, 100), Some(0));
        assert_eq!(frame_index(10.0, 30.0, 100), Some(99));
        assert_eq!(frame_index(1.0, 30.0, 0), None);
        assert_eq!(frame_index(1.0, 0.0, 100), None);
        assert_eq!(frame_index(f64::NAN, 30.0, 100), None);
    }

    #[test]
    fn test_nearest_sample_and_pointer() {
        let timeline = TimelineResolver::new()
            .resolve(&pointer_record(), &SecondaryTimeline::video())
            .unwrap();

        let nearest = timeline.nearest_sample("Mouse", 0.6).unwrap();
        assert!((nearest.resolved_time - 0.5).abs() < 1e-9);
        // Equidistant from 0.5 and 1.0: the earlier sample wins
        let tie = timeline.nearest_sample("Mouse", 0.75).unwrap();
        assert!((tie.resolved_time - 0.5).abs() < 1e-9);
        assert_eq!(timeline.pointer_at("Mouse", 0.9), Some((30.0, 5.0)));
        assert_eq!(timeline.pointer_at("EEG", 0.4), None);
        assert!(timeline.nearest_sample("Webcam", 0.0).is_none());

        let entry = timeline.nearest_sample("Mouse", 1.0).unwrap();
        assert_eq!(entry.frame_index(30.0, 1000), Some(30));
    }

    #[test]
    fn test_pointer_trail_window() {
        let timeline = TimelineResolver::new()
            .resolve(&pointer_record(), &SecondaryTimeline::video())
            .unwrap();

        assert_eq!(
            timeline.pointer_trail("Mouse", 1.0, 2.0),
            vec![(10.0, 5.0), (20.0, 5.0), (30.0, 5.0)]
        );
        assert_eq!(timeline.pointer_trail("Mouse", 2.0, 1.0), vec![(30.0, 5.0), (40.0, 5.0)]);
        assert_eq!(timeline.samples_in_window("Mouse", 0.2, 0.1).count(), 0);
        assert_eq!(timeline.samples_of("Mouse").count(), 5);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let good = anchored_record();
        let bad = builder().into_record();
        let results = TimelineResolver::new().resolve_batch([&good, &bad, &good], &SecondaryTimeline::video());

        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic(
            stamps in prop::collection::vec(600.0f64..700.0, 0..40),
            anchor in 600.0f64..700.0,
        ) {
            let mut b = builder();
            b.append_event(event(event_types::VIDEO_RECORDING_STARTED, anchor));
            for (i, ts) in stamps.iter().enumerate() {
                if i % 3 == 0 {
                    b.append_event(event("tick", *ts));
                } else {
                    b.append_sample(sample("EEG", *ts).with_offset(0.01, ReferenceTime(*ts)));
                }
            }
            let record = b.into_record();
            let resolver = TimelineResolver::new();
            let first = resolver.resolve(&record, &SecondaryTimeline::video()).unwrap();
            let second = resolver.resolve(&record, &SecondaryTimeline::video()).unwrap();
            prop_assert_eq!(&first, &second);

            for pair in first.entries.windows(2) {
                prop_assert!(pair[0].entity.reference_timestamp() <= pair[1].entity.reference_timestamp());
            }
            for entry in &first.entries {
                let expected = entry.entity.reference_timestamp().as_secs_f64() - anchor;
                prop_assert!((entry.resolved_time - expected).abs() < 1e-9);
            }
        }
    }
}
