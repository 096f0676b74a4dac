//! Flat tracking record
//!
//! A chronological list mixing pointer positions and surface events, written
//! next to the sync record as `tracking_data.json` for tools that do not
//! want to walk per-stream samples.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use syncline_core::{event_types, MouseAction, ReferenceTime, StreamSample, SyncError, SyncResult};

use crate::SessionSyncRecord;

/// Default file name of the flat tracking record
pub const TRACKING_FILE_NAME: &str = "tracking_data.json";

/// Stream-name fragment identifying pointer position streams
const POSITION_STREAM_HINT: &str = "mouse";

/// A forwarded surface event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub timestamp: f64,
    pub relative_time: f64,
    /// `bridge_event`, or `session_start` for the opening event
    pub event_type: String,
    pub bridge_event_type: String,
    #[serde(default)]
    pub bridge_event_data: Map<String, Value>,
}

/// One pointer position sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub timestamp: f64,
    pub relative_time: f64,
    pub stream_name: String,
    pub mouse_position: [f64; 2],
    /// `mouse_press`, `mouse_release`, ... ; absent for plain position ticks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse_event: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackingEntry {
    Event(TrackedEvent),
    Position(TrackedPosition),
}

impl TrackingEntry {
    pub fn timestamp(&self) -> f64 {
        match self {
            TrackingEntry::Event(e) => e.timestamp,
            TrackingEntry::Position(p) => p.timestamp,
        }
    }

    fn from_position_sample(sample: &StreamSample) -> Option<Self> {
        let is_position_stream = sample
            .stream_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(POSITION_STREAM_HINT))
            .unwrap_or(false)
            || sample.stream_name.matches_any(&[POSITION_STREAM_HINT]);
        if !is_position_stream {
            return None;
        }
        let channels = sample.payload.as_numeric()?;
        let [x, y, rest @ ..] = channels else {
            return None;
        };
        let mouse_event = rest
            .first()
            .and_then(|code| MouseAction::from_code(*code))
            .and_then(MouseAction::event_name)
            .map(str::to_string);
        Some(TrackingEntry::Position(TrackedPosition {
            timestamp: sample.reference_timestamp.as_secs_f64(),
            relative_time: sample.relative_time,
            stream_name: sample.stream_name.to_string(),
            mouse_position: [*x, *y],
            mouse_event,
        }))
    }
}

/// Chronologically ordered tracking entries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingLog {
    pub entries: Vec<TrackingEntry>,
}

impl TrackingLog {
    /// Flatten a sync record. Entries with equal timestamps keep record order,
    /// positions first.
    pub fn from_record(record: &SessionSyncRecord) -> Self {
        let start = record.session_start_reference_time;
        let mut entries: Vec<TrackingEntry> = record
            .streams
            .iter()
            .filter_map(TrackingEntry::from_position_sample)
            .collect();

        entries.extend(record.all_events().into_iter().map(|event| {
            let tag = if event.event_type == event_types::SESSION_START {
                event_types::SESSION_START
            } else {
                event_types::BRIDGE_EVENT
            };
            TrackingEntry::Event(TrackedEvent {
                timestamp: event.reference_timestamp.as_secs_f64(),
                relative_time: event.reference_timestamp.since(start),
                event_type: tag.to_string(),
                bridge_event_type: event.event_type,
                bridge_event_data: event.payload,
            })
        }));

        entries.sort_by(|a, b| {
            ReferenceTime(a.timestamp()).total_cmp(&ReferenceTime(b.timestamp()))
        });
        TrackingLog { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &TrackedEvent> {
        self.entries.iter().filter_map(|e| match e {
            TrackingEntry::Event(ev) => Some(ev),
            TrackingEntry::Position(_) => None,
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = &TrackedPosition> {
        self.entries.iter().filter_map(|e| match e {
            TrackingEntry::Position(p) => Some(p),
            TrackingEntry::Event(_) => None,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(entries = self.entries.len(), path = %path.display(), "tracking record saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&text).map_err(|e| SyncError::MalformedRecord(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncRecordBuilder;
    use syncline_core::{
        ClockDomain, DiscreteEvent, Payload, Provenance, SessionId, StreamName,
    };

    fn record() -> SessionSyncRecord {
        let start = ReferenceTime(100.0);
        let mut b = SyncRecordBuilder::new(
            SessionId::new("s"),
            start,
            ClockDomain::new("reference_clock", true, "test"),
        );
        b.append_event(DiscreteEvent::new(
            event_types::SESSION_START,
            Map::new(),
            ReferenceTime(100.0),
            Provenance::ReferenceClock,
        ));
        b.append_sample(
            StreamSample::new(
                StreamName::new("MadsPipeline_MouseTracking"),
                ReferenceTime(101.0),
                start,
                MouseAction::Press.position_payload(0.25, 0.75),
            )
            .with_stream_type("Mouse"),
        );
        b.append_sample(StreamSample::new(
            StreamName::new("EEG"),
            ReferenceTime(100.5),
            start,
            Payload::Numeric(vec![1.0, 2.0, 3.0]),
        ));
        let mut click = Map::new();
        click.insert("id".into(), "next".into());
        b.append_event(DiscreteEvent::new(
            "button_click",
            click,
            ReferenceTime(100.5),
            Provenance::ReferenceClock,
        ));
        b.into_record()
    }

    #[test]
    fn test_flatten_orders_chronologically() {
        let log = TrackingLog::from_record(&record());
        let stamps: Vec<f64> = log.entries.iter().map(TrackingEntry::timestamp).collect();
        assert_eq!(stamps, vec![100.0, 100.5, 101.0]);
    }

    #[test]
    fn test_events_are_tagged() {
        let log = TrackingLog::from_record(&record());
        let events: Vec<_> = log.events().collect();
        assert_eq!(events[0].event_type, "session_start");
        assert_eq!(events[1].event_type, "bridge_event");
        assert_eq!(events[1].bridge_event_type, "button_click");
        assert_eq!(events[1].bridge_event_data["id"], "next");
        assert!((events[1].relative_time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_only_position_streams_become_positions() {
        let log = TrackingLog::from_record(&record());
        let positions: Vec<_> = log.positions().collect();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].mouse_position, [0.25, 0.75]);
        assert_eq!(positions[0].mouse_event.as_deref(), Some("mouse_press"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TRACKING_FILE_NAME);
        let log = TrackingLog::from_record(&record());
        log.save(&path).unwrap();

        let loaded = TrackingLog::load(&path).unwrap();
        assert_eq!(loaded, log);
        assert_eq!(loaded.len(), 3);
    }
}
