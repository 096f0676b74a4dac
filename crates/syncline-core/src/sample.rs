//! Continuous stream samples
//!
//! Field names on the wire follow the streaming layer's convention
//! (`timestamp`, `data`, `local_time_when_recorded`), so records written by
//! older recorders stay loadable.

use serde::{Deserialize, Serialize};

use crate::{Payload, ReferenceTime, SessionId, StreamName};

/// Static description of a continuous source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub name: StreamName,
    #[serde(rename = "type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub channel_count: usize,
    #[serde(default)]
    pub source_id: String,
    /// Nominal rate in Hz; zero for irregular (event) streams
    #[serde(default)]
    pub nominal_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl StreamInfo {
    pub fn new(name: impl Into<String>, stream_type: impl Into<String>, channel_count: usize) -> Self {
        StreamInfo {
            name: StreamName::new(name),
            stream_type: stream_type.into(),
            channel_count,
            source_id: String::new(),
            nominal_rate: 0.0,
            session_id: None,
        }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn with_nominal_rate(mut self, hz: f64) -> Self {
        self.nominal_rate = hz;
        self
    }

    #[inline]
    pub fn is_irregular(&self) -> bool {
        self.nominal_rate <= 0.0
    }
}

/// One data point from a continuous source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamSample {
    pub stream_name: StreamName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<String>,
    #[serde(rename = "timestamp")]
    pub reference_timestamp: ReferenceTime,
    /// Seconds since the session's reference start
    #[serde(default)]
    pub relative_time: f64,
    #[serde(rename = "data")]
    pub payload: Payload,
    /// Original payload when `payload` was decoded from it
    #[serde(rename = "raw_data", default, skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<Payload>,
    /// Source clock minus reference clock, seconds. `None` means local or
    /// unmeasured, which is not the same as a measured zero.
    #[serde(default)]
    pub clock_offset: Option<f64>,
    /// Reference time at which `clock_offset` was measured
    #[serde(rename = "local_time_when_recorded", default)]
    pub offset_measured_at: Option<ReferenceTime>,
}

impl StreamSample {
    /// Build a sample whose relative time is derived from the session start
    pub fn new(
        stream_name: StreamName,
        reference_timestamp: ReferenceTime,
        session_start: ReferenceTime,
        payload: Payload,
    ) -> Self {
        StreamSample {
            stream_name,
            stream_type: None,
            reference_timestamp,
            relative_time: reference_timestamp.since(session_start),
            payload,
            raw_payload: None,
            clock_offset: None,
            offset_measured_at: None,
        }
    }

    pub fn with_stream_type(mut self, stream_type: impl Into<String>) -> Self {
        self.stream_type = Some(stream_type.into());
        self
    }

    pub fn with_offset(mut self, clock_offset: f64, measured_at: ReferenceTime) -> Self {
        self.clock_offset = Some(clock_offset);
        self.offset_measured_at = Some(measured_at);
        self
    }

    /// `reference_timestamp + clock_offset`; `None` without a measured offset
    #[inline]
    pub fn corrected_timestamp(&self) -> Option<ReferenceTime> {
        self.clock_offset
            .map(|offset| self.reference_timestamp.offset_by(offset))
    }

    /// Recompute `relative_time` against a session start
    pub fn rebase(&mut self, session_start: ReferenceTime) {
        self.relative_time = self.reference_timestamp.since(session_start);
    }

    #[inline]
    pub fn has_offset(&self) -> bool {
        self.clock_offset.is_some()
    }
}
