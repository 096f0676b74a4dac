//! Syncline Core - Fundamental types for multi-clock synchronization
//!
//! This crate defines the types shared by every Syncline component:
//! - Identifiers (SessionId, StreamName)
//! - Time primitives (ReferenceTime, ClockDomain, TimelinePosition)
//! - Stream samples and their payloads
//! - Discrete events, provenance and timeline anchors
//! - Error types

pub mod id;
pub mod time;
pub mod payload;
pub mod sample;
pub mod event;
pub mod error;

pub use id::*;
pub use time::*;
pub use payload::*;
pub use sample::*;
pub use event::*;
pub use error::*;
