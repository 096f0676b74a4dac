//! Syncline Record - Session sync records and timeline resolution
//!
//! This crate owns what a session leaves behind:
//! - Sync record builder (arrival-order accumulation, event sinks)
//! - Persisted JSON record with self-describing sync metadata
//! - Flat tracking record for position/event tools
//! - Timeline resolver for aligning secondary timelines post hoc

pub mod builder;
pub mod record;
pub mod tracking;
pub mod resolver;

pub use builder::*;
pub use record::*;
pub use tracking::*;
pub use resolver::*;
