//! Syncline Runtime - Recording session orchestration
//!
//! This crate runs a recording session end to end:
//! 1. Select streams by name filter
//! 2. Fix the session start on the reference clock
//! 3. Poll each stream on its own schedule (offset collector)
//! 4. Stamp pushed surface events at arrival (event timestamper)
//! 5. Accumulate everything in arrival order (sync record builder)
//! 6. On stop: drain queued events, finalize, persist
//!
//! Configuration and tracing setup live here as well.

pub mod config;
pub mod error;
pub mod feed;
pub mod recorder;
pub mod telemetry;

pub use config::*;
pub use error::*;
pub use feed::*;
pub use recorder::*;
pub use telemetry::*;
