//! Recorder configuration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use syncline_core::{SessionId, StreamName};
use syncline_record::{RECORD_FILE_NAME, TRACKING_FILE_NAME};

use crate::{RecorderError, RecorderResult};

/// Shortest poll period accepted for any stream
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            json: false,
            include_targets: true,
        }
    }
}

/// Recording session configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Fixed session id; a random one is generated when unset
    pub session_id: Option<String>,
    /// Default poll period for every stream (ms)
    pub poll_interval_ms: u64,
    /// Per-stream overrides keyed by exact stream name (ms)
    pub stream_poll_intervals_ms: BTreeMap<String, u64>,
    /// Case-insensitive name filters; empty records every stream
    pub stream_filters: Vec<String>,
    /// Decode JSON marker strings into structured payloads
    pub decode_markers: bool,
    /// Capacity of the pushed-event queue
    pub event_channel_capacity: usize,
    /// How long streams keep being polled after a `session_end` event (ms)
    pub session_end_grace_ms: u64,
    /// Parent directory for session output; nothing is written when unset
    pub output_dir: Option<PathBuf>,
    pub record_file_name: String,
    pub tracking_file_name: String,
    /// Also write the flat tracking record
    pub write_tracking: bool,
    pub log: LogConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            session_id: None,
            poll_interval_ms: 20,
            stream_poll_intervals_ms: BTreeMap::new(),
            stream_filters: Vec::new(),
            decode_markers: true,
            event_channel_capacity: 1024,
            session_end_grace_ms: 500,
            output_dir: None,
            record_file_name: RECORD_FILE_NAME.to_string(),
            tracking_file_name: TRACKING_FILE_NAME.to_string(),
            write_tracking: true,
            log: LogConfig::default(),
        }
    }
}

impl RecorderConfig {
    /// Fast polling for high-rate physiological streams
    pub fn high_rate() -> Self {
        RecorderConfig {
            poll_interval_ms: 4,
            event_channel_capacity: 4096,
            ..Default::default()
        }
    }

    /// Slow polling, no flat tracking output
    pub fn low_overhead() -> Self {
        RecorderConfig {
            poll_interval_ms: 100,
            event_channel_capacity: 256,
            write_tracking: false,
            ..Default::default()
        }
    }

    /// Parse a JSON configuration; missing keys take their defaults
    pub fn from_json_str(text: &str) -> RecorderResult<Self> {
        let config: RecorderConfig =
            serde_json::from_str(text).map_err(|e| RecorderError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_stream_filters<S: Into<String>>(mut self, filters: impl IntoIterator<Item = S>) -> Self {
        self.stream_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stream_interval(mut self, stream: impl Into<String>, interval_ms: u64) -> Self {
        self.stream_poll_intervals_ms.insert(stream.into(), interval_ms);
        self
    }

    pub fn validate(&self) -> RecorderResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(RecorderError::Config("event_channel_capacity must be > 0".into()));
        }
        if self.record_file_name.is_empty() {
            return Err(RecorderError::Config("record_file_name is empty".into()));
        }
        if self.write_tracking && self.tracking_file_name == self.record_file_name {
            return Err(RecorderError::Config(
                "tracking_file_name must differ from record_file_name".into(),
            ));
        }
        Ok(())
    }

    /// Session id to record under
    pub fn resolve_session_id(&self) -> SessionId {
        match &self.session_id {
            Some(id) if !id.is_empty() => SessionId::new(id.clone()),
            _ => SessionId::generate(),
        }
    }

    /// Poll period for one stream, never below `MIN_POLL_INTERVAL_MS`
    pub fn poll_interval_for(&self, stream: &StreamName) -> Duration {
        let ms = self
            .stream_poll_intervals_ms
            .get(stream.as_str())
            .copied()
            .unwrap_or(self.poll_interval_ms);
        Duration::from_millis(ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn session_end_grace(&self) -> Duration {
        Duration::from_millis(self.session_end_grace_ms)
    }

    /// `<output_dir>/<session_id>`, when output is enabled
    pub fn session_dir(&self, session_id: &SessionId) -> Option<PathBuf> {
        self.output_dir
            .as_deref()
            .map(|dir: &Path| dir.join(session_id.as_str()))
    }
}
