//! End-to-end Integration Test Suite
//!
//! Tests that verify the complete recording-to-analysis flow:
//! - Simulated devices recorded against one reference clock
//! - Persisted records reloaded without loss
//! - Secondary timelines resolved from the anchor event
//! - Offset health summarised after the fact

use syncline_core::{SecondaryTimeline, SyncResult};
use syncline_record::{ResolvedTimeline, SessionSyncRecord, TimelineResolver};

/// Serialize a record to JSON text and parse it back
pub fn json_round_trip(record: &SessionSyncRecord) -> SyncResult<SessionSyncRecord> {
    SessionSyncRecord::from_json_str(&record.to_json_string()?)
}

/// Resolve a record against the screen-recording timeline
pub fn resolve_video(record: &SessionSyncRecord) -> SyncResult<ResolvedTimeline> {
    TimelineResolver::new().resolve(record, &SecondaryTimeline::video())
}
