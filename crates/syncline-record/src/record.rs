//! Persisted session sync record
//!
//! One JSON document per session. Top-level keys follow the streaming
//! layer's naming (`lsl_samples`, `session_start_time`) so older records and
//! older readers stay mutually loadable. Optional offset fields are written
//! as explicit `null`, never as zero.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use syncline_core::{
    event_types, ClockDomain, DiscreteEvent, Payload, Provenance, ReferenceTime, SessionId,
    StreamInfo, StreamSample, SyncError, SyncResult,
};

/// Default file name of the persisted record
pub const RECORD_FILE_NAME: &str = "lsl_recorded_data.json";

/// Synchronization method written into every record
pub const SYNC_METHOD: &str = "LSL_local_clock";

/// Sign convention of `clock_offset`
pub const CLOCK_OFFSET_TYPE: &str =
    "offset between source and reference clocks (seconds); synchronized_time = source_timestamp + clock_offset";

/// Self-describing synchronization metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(default)]
    pub sync_method: String,
    #[serde(default)]
    pub clock_offset_type: String,
    #[serde(default)]
    pub note: String,
    /// Reference domain all timestamps are expressed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_clock: Option<ClockDomain>,
    /// Event types usable as timeline anchors
    #[serde(default)]
    pub anchor_event_types: Vec<String>,
    /// Events stamped from the wall clock because the reference clock was missing
    #[serde(default)]
    pub fallback_event_count: usize,
}

impl SyncMetadata {
    pub fn describe(reference_clock: ClockDomain, fallback_event_count: usize) -> Self {
        SyncMetadata {
            sync_method: SYNC_METHOD.to_string(),
            clock_offset_type: CLOCK_OFFSET_TYPE.to_string(),
            note: format!(
                "Use clock_offset from each sample for post-hoc synchronization; \
                 events of type {} mark the zero point of the screen recording",
                event_types::VIDEO_RECORDING_STARTED
            ),
            reference_clock: Some(reference_clock),
            anchor_event_types: event_types::ANCHOR_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            fallback_event_count,
        }
    }

    /// Whether any timestamp in the record came from the wall-clock fallback
    pub fn is_degraded(&self) -> bool {
        self.fallback_event_count > 0
            || self
                .reference_clock
                .as_ref()
                .map(|c| !c.is_monotonic)
                .unwrap_or(false)
    }
}

impl Default for SyncMetadata {
    fn default() -> Self {
        SyncMetadata {
            sync_method: String::new(),
            clock_offset_type: String::new(),
            note: String::new(),
            reference_clock: None,
            anchor_event_types: Vec::new(),
            fallback_event_count: 0,
        }
    }
}

/// The persisted aggregate of one session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSyncRecord {
    pub session_id: SessionId,
    #[serde(rename = "session_start_time")]
    pub session_start_reference_time: ReferenceTime,
    #[serde(default)]
    pub total_samples: usize,
    #[serde(default)]
    pub stream_info: Vec<StreamInfo>,
    #[serde(rename = "synchronization_info", default)]
    pub sync_metadata: SyncMetadata,
    /// Samples in arrival order
    #[serde(rename = "lsl_samples", default)]
    pub streams: Vec<StreamSample>,
    /// Events in arrival order
    #[serde(default)]
    pub events: Vec<DiscreteEvent>,
}

impl SessionSyncRecord {
    /// Parse a record, tolerating fields older recorders did not write.
    ///
    /// `session_id` is required. A missing `session_start_time` is recovered
    /// from the first sample (`timestamp - relative_time`); if that is not
    /// possible the record is malformed. Missing `relative_time` values are
    /// recomputed from the session start.
    pub fn from_json_str(text: &str) -> SyncResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SyncError::MalformedRecord(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> SyncResult<Self> {
        let Value::Object(mut obj) = value else {
            return Err(SyncError::MalformedRecord("record is not a JSON object".into()));
        };

        match obj.get("session_id") {
            Some(Value::String(_)) => {}
            Some(Value::Number(n)) => {
                let id = n.to_string();
                obj.insert("session_id".into(), Value::String(id));
            }
            _ => return Err(SyncError::MalformedRecord("missing session_id".into())),
        }

        let start = match obj.get("session_start_time").and_then(Value::as_f64) {
            Some(start) => start,
            None => {
                let start = recover_session_start(&obj).ok_or_else(|| {
                    SyncError::MalformedRecord("missing session_start_time".into())
                })?;
                obj.insert("session_start_time".into(), Value::from(start));
                start
            }
        };

        if let Some(Value::Array(samples)) = obj.get_mut("lsl_samples") {
            for sample in samples.iter_mut() {
                fill_relative_time(sample, start);
            }
        }

        serde_json::from_value(Value::Object(obj))
            .map_err(|e| SyncError::MalformedRecord(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> SyncResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the record, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        tracing::info!(
            session = %self.session_id,
            samples = self.streams.len(),
            events = self.events.len(),
            path = %path.display(),
            "sync record saved"
        );
        Ok(())
    }

    /// Events carried inside marker-stream samples.
    ///
    /// Older recorders pushed surface events through a one-channel string
    /// stream; a structured sample with a `type` key is such an event.
    pub fn marker_events(&self) -> Vec<DiscreteEvent> {
        self.streams
            .iter()
            .filter_map(|sample| {
                let Payload::Structured(obj) = &sample.payload else {
                    return None;
                };
                let event_type = obj.get("type")?.as_str()?.to_string();
                let payload = match obj.get("data") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Map::new(),
                };
                let mut event = DiscreteEvent::new(
                    event_type,
                    payload,
                    sample.reference_timestamp,
                    Provenance::ReferenceClock,
                );
                event.display_timestamp = obj
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(event)
            })
            .collect()
    }

    /// Directly recorded events followed by marker-stream events.
    ///
    /// A recorder that also captures its own marker stream sees every bridge
    /// event twice. Marker events of a type that was recorded directly are
    /// echoes and are left out.
    pub fn all_events(&self) -> Vec<DiscreteEvent> {
        let direct: HashSet<&str> = self.events.iter().map(|e| e.event_type.as_str()).collect();
        let mut events = self.events.clone();
        events.extend(
            self.marker_events()
                .into_iter()
                .filter(|e| !direct.contains(e.event_type.as_str())),
        );
        events
    }

    /// Span between the first and last sample's relative time
    pub fn session_duration(&self) -> Option<f64> {
        let first = self.streams.first()?.relative_time;
        let last = self.streams.last()?.relative_time;
        Some(last - first)
    }

    pub fn samples_for<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a StreamSample> + 'a {
        self.streams.iter().filter(move |s| s.stream_name == stream)
    }
}

fn recover_session_start(obj: &Map<String, Value>) -> Option<f64> {
    let first = obj.get("lsl_samples")?.as_array()?.first()?;
    let ts = first.get("timestamp")?.as_f64()?;
    let rel = first.get("relative_time").and_then(Value::as_f64).unwrap_or(0.0);
    Some(ts - rel)
}

fn fill_relative_time(sample: &mut Value, start: f64) {
    let Value::Object(map) = sample else {
        return;
    };
    if map.get("relative_time").map_or(true, Value::is_null) {
        if let Some(ts) = map.get("timestamp").and_then(Value::as_f64) {
            map.insert("relative_time".into(), Value::from(ts - start));
        }
    }
}
