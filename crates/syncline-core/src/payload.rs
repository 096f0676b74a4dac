//! Sample payloads
//!
//! Streams carry one of a small closed set of shapes. On the wire the shape
//! is implied by the JSON value itself, so older records written without any
//! tag still load. Each shape has exactly one wire form:
//! - `Numeric`: array of numbers (`null` for a non-finite reading)
//! - `Text`: string
//! - `Bytes`: `{"raw_bytes": [u8, ..]}`
//! - `Structured`: any other object

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key used to mark a raw byte payload on the wire
pub const RAW_BYTES_KEY: &str = "raw_bytes";

/// Payload of one stream sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", from = "Value")]
pub enum Payload {
    /// Numeric channel vector (sensor / position streams)
    Numeric(Vec<f64>),
    /// Single string token (marker streams)
    Text(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// A marker string that decoded as a JSON object. A map of exactly the
    /// `raw_bytes` shape is the wire form of `Bytes` and never lands here.
    Structured(Map<String, Value>),
}

impl Payload {
    /// Upgrade a text payload that holds a JSON object into its structured
    /// form. Returns the structured payload and the original text, or `None`
    /// if this payload is not object text.
    pub fn parse_structured(&self) -> Option<(Payload, Payload)> {
        let Payload::Text(text) = self else {
            return None;
        };
        match serde_json::from_str::<Value>(text).ok()? {
            Value::Object(map) if decode_raw_bytes(&map).is_none() => {
                Some((Payload::Structured(map), Payload::Text(text.clone())))
            }
            _ => None,
        }
    }

    /// Number of channels this payload occupies
    pub fn channel_count(&self) -> usize {
        match self {
            Payload::Numeric(values) => values.len(),
            Payload::Text(_) | Payload::Bytes(_) | Payload::Structured(_) => 1,
        }
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Payload::Numeric(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Structured(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Numeric(values) => Value::Array(values.into_iter().map(Value::from).collect()),
            Payload::Text(text) => Value::String(text),
            Payload::Bytes(bytes) => {
                let mut map = Map::new();
                map.insert(
                    RAW_BYTES_KEY.to_string(),
                    Value::Array(bytes.into_iter().map(Value::from).collect()),
                );
                Value::Object(map)
            }
            Payload::Structured(map) => Value::Object(map),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Payload::Text(text),
            Value::Array(items) => {
                if let Some(numbers) = items.iter().map(numeric_channel).collect::<Option<Vec<_>>>() {
                    return Payload::Numeric(numbers);
                }
                // Older records store marker samples as one-element string lists
                if let [Value::String(text)] = items.as_slice() {
                    return Payload::Text(text.clone());
                }
                Payload::Text(Value::Array(items).to_string())
            }
            Value::Object(map) => match decode_raw_bytes(&map) {
                Some(bytes) => Payload::Bytes(bytes),
                None => Payload::Structured(map),
            },
            Value::Number(n) => Payload::Numeric(n.as_f64().into_iter().collect()),
            Value::Null => Payload::Numeric(Vec::new()),
            Value::Bool(b) => Payload::Text(b.to_string()),
        }
    }
}

fn numeric_channel(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(f64::NAN),
        other => other.as_f64(),
    }
}

fn decode_raw_bytes(map: &Map<String, Value>) -> Option<Vec<u8>> {
    if map.len() != 1 {
        return None;
    }
    map.get(RAW_BYTES_KEY)?
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

/// Mouse action encoded in the third channel of a position sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseAction {
    Position = 0,
    Press = 1,
    Release = 2,
    Move = 3,
    Scroll = 4,
}

impl MouseAction {
    /// Map a host event name (`mouse_press`, ...) to an action.
    /// Unknown names are plain position ticks.
    pub fn from_event_name(name: &str) -> Self {
        match name {
            "mouse_press" => MouseAction::Press,
            "mouse_release" => MouseAction::Release,
            "mouse_move" => MouseAction::Move,
            "mouse_scroll" => MouseAction::Scroll,
            _ => MouseAction::Position,
        }
    }

    /// Exact codes only; fractional or out-of-range values are not actions
    pub fn from_code(code: f64) -> Option<Self> {
        [
            MouseAction::Position,
            MouseAction::Press,
            MouseAction::Release,
            MouseAction::Move,
            MouseAction::Scroll,
        ]
        .into_iter()
        .find(|action| action.to_code() == code)
    }

    #[inline]
    pub fn to_code(self) -> f64 {
        self as u8 as f64
    }

    /// Host event name; plain position ticks have none
    pub fn event_name(self) -> Option<&'static str> {
        match self {
            MouseAction::Position => None,
            MouseAction::Press => Some("mouse_press"),
            MouseAction::Release => Some("mouse_release"),
            MouseAction::Move => Some("mouse_move"),
            MouseAction::Scroll => Some("mouse_scroll"),
        }
    }

    /// Build a 3-channel `[x, y, code]` position payload
    pub fn position_payload(self, x: f64, y: f64) -> Payload {
        Payload::Numeric(vec![x, y, self.to_code()])
    }
}
