//! Runtime error types

use syncline_core::SyncError;
use thiserror::Error;

/// Errors raised by the recording runtime
#[derive(Debug, Error)]
pub enum RecorderError {
    // Intake errors
    #[error("Event channel full ({capacity} queued)")]
    ChannelFull { capacity: usize },

    #[error("Recorder stopped; event not accepted")]
    Stopped,

    // Setup errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Telemetry init failed: {0}")]
    Telemetry(String),

    #[error("Recorder task failed: {0}")]
    Task(String),

    // Persistence
    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;
