//! Discrete event definitions
//!
//! Events are markers pushed by an external content surface (button clicks,
//! page changes, "recording started"). Each carries a type, a key/value
//! payload, a reference-domain timestamp and the provenance of that timestamp.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ReferenceTime;

/// Reserved event types
pub mod event_types {
    /// First event of every session
    pub const SESSION_START: &str = "session_start";
    /// Asks the host to end the session; never recorded as data
    pub const SESSION_END: &str = "session_end";
    /// Zero point of the screen-recording timeline
    pub const VIDEO_RECORDING_STARTED: &str = "video_recording_started";
    /// Tag used for forwarded surface events in the flat tracking record
    pub const BRIDGE_EVENT: &str = "bridge_event";

    /// Types that may serve as a timeline anchor
    pub const ANCHOR_TYPES: &[&str] = &[VIDEO_RECORDING_STARTED];
}

/// Payload key carrying the anchor's reference timestamp
pub const ANCHOR_TIMESTAMP_KEY: &str = "lsl_timestamp";

/// Which clock produced an event's `reference_timestamp`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Stamped from the shared reference clock; alignable across devices
    #[default]
    ReferenceClock,
    /// Reference clock unavailable; stamped from the wall clock.
    /// Cannot be aligned with other devices.
    WallClockFallback,
}

impl Provenance {
    #[inline]
    pub fn is_alignable(self) -> bool {
        self == Provenance::ReferenceClock
    }
}

/// An event as delivered by the external surface, not yet stamped
#[derive(Clone, Debug, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub payload: Map<String, Value>,
    /// Wall-clock string supplied by the surface, if any
    pub display_timestamp: Option<String>,
}

impl RawEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        RawEvent {
            event_type: event_type.into(),
            payload: Map::new(),
            display_timestamp: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Parse a surface message.
    ///
    /// Only a JSON object with a `type` key is an event; `data` defaults to an
    /// empty map and a string `timestamp` becomes the display timestamp.
    /// Anything else (plain text, other JSON) is a chat message, not an event.
    pub fn from_bridge_message(msg: &str) -> Option<Self> {
        let Value::Object(mut obj) = serde_json::from_str::<Value>(msg).ok()? else {
            return None;
        };
        let event_type = match obj.remove("type")? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let payload = match obj.remove("data") {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        let display_timestamp = match obj.remove("timestamp") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        Some(RawEvent {
            event_type,
            payload,
            display_timestamp,
        })
    }

    #[inline]
    pub fn is_session_end(&self) -> bool {
        self.event_type == event_types::SESSION_END
    }
}

/// A stamped, immutable marker event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscreteEvent {
    pub event_type: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(rename = "timestamp")]
    pub reference_timestamp: ReferenceTime,
    /// Human-readable wall clock; informational only, never used for ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_timestamp: Option<String>,
    #[serde(rename = "time_source", default)]
    pub provenance: Provenance,
}

impl DiscreteEvent {
    pub fn new(
        event_type: impl Into<String>,
        payload: Map<String, Value>,
        reference_timestamp: ReferenceTime,
        provenance: Provenance,
    ) -> Self {
        DiscreteEvent {
            event_type: event_type.into(),
            payload,
            reference_timestamp,
            display_timestamp: None,
            provenance,
        }
    }

    #[inline]
    pub fn is_anchor_for(&self, timeline: &SecondaryTimeline) -> bool {
        self.event_type == timeline.anchor_type
    }

    /// Reference timestamp recorded inside an anchor payload, if present
    pub fn anchor_payload_timestamp(&self) -> Option<ReferenceTime> {
        self.payload
            .get(ANCHOR_TIMESTAMP_KEY)
            .and_then(Value::as_f64)
            .map(ReferenceTime)
    }
}

/// A secondary timeline (e.g. a video track) and the event type that anchors it
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondaryTimeline {
    pub name: String,
    pub anchor_type: String,
}

impl SecondaryTimeline {
    pub fn new(name: impl Into<String>, anchor_type: impl Into<String>) -> Self {
        SecondaryTimeline {
            name: name.into(),
            anchor_type: anchor_type.into(),
        }
    }

    /// Screen recording timeline anchored by `video_recording_started`
    pub fn video() -> Self {
        SecondaryTimeline::new("screen_recording", event_types::VIDEO_RECORDING_STARTED)
    }
}

/// The zero point of a secondary timeline, located in a record
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncAnchor {
    /// Index of the anchor within the record's event sequence
    pub event_index: usize,
    pub reference_timestamp: ReferenceTime,
    /// Clock the anchor was stamped from
    pub provenance: Provenance,
}

impl SyncAnchor {
    /// Whether the zero point lies in the reference clock domain
    #[inline]
    pub fn is_alignable(&self) -> bool {
        self.provenance.is_alignable()
    }
}
