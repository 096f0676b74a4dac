//! Syncline Time - Reference clocks and stamping
//!
//! This crate implements the recording-side time handling:
//! - Clock capability strategy (reference clock or wall-clock fallback)
//! - Offset sample collector for continuous streams
//! - Event timestamper for pushed surface events
//! - Offset statistics for post-hoc analysis

pub mod clock;
pub mod collector;
pub mod stamper;
pub mod offsets;

pub use clock::*;
pub use collector::*;
pub use stamper::*;
pub use offsets::*;
