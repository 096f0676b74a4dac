//! Syncline Test Harness - Session simulation and synchronization validation
//!
//! This crate provides:
//! - Drifting device clocks and simulated streams
//! - Deterministic sessions driven by a manual reference clock
//! - End-to-end integration testing

pub mod integration;
pub mod session_simulator;
pub mod time_simulator;

pub use integration::*;
pub use session_simulator::*;
pub use time_simulator::*;
