//! Event timestamper
//!
//! Converts surface events into reference-domain `DiscreteEvent`s. With the
//! wall-clock fallback injected, events still get captured, flagged so that
//! consumers know they cannot be aligned across devices.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use syncline_core::{event_types, DiscreteEvent, Provenance, RawEvent, ANCHOR_TIMESTAMP_KEY};

use crate::clock::display_now;
use crate::ClockSource;

/// Event timestamper
pub struct EventTimestamper {
    /// Injected clock (reference or fallback)
    clock: Arc<dyn ClockSource>,
    /// Events stamped so far
    stamped: AtomicU64,
    /// Whether the degraded-precision warning was already logged
    fallback_warned: AtomicBool,
}

impl EventTimestamper {
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        EventTimestamper {
            clock,
            stamped: AtomicU64::new(0),
            fallback_warned: AtomicBool::new(false),
        }
    }

    /// Stamp a raw event. Consumes it, so an event can be stamped only once.
    /// Never fails.
    pub fn stamp(&self, raw: RawEvent) -> DiscreteEvent {
        let reference_timestamp = self.clock.now();
        let provenance = self.clock.provenance();

        if provenance == Provenance::WallClockFallback
            && !self.fallback_warned.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                event_type = %raw.event_type,
                "stamping events from the wall clock; cross-device alignment unavailable"
            );
        }

        let RawEvent {
            event_type,
            mut payload,
            display_timestamp,
        } = raw;

        if event_types::ANCHOR_TYPES.contains(&event_type.as_str()) {
            payload
                .entry(ANCHOR_TIMESTAMP_KEY)
                .or_insert_with(|| Value::from(reference_timestamp.as_secs_f64()));
        }

        let mut event = DiscreteEvent::new(event_type, payload, reference_timestamp, provenance);
        event.display_timestamp = Some(display_timestamp.unwrap_or_else(display_now));

        self.stamped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            event_type = %event.event_type,
            t = %event.reference_timestamp,
            "event stamped"
        );
        event
    }

    /// Convenience: stamp a `video_recording_started` anchor for `session_id`
    pub fn stamp_anchor(&self, anchor_type: &str, session_id: &str) -> DiscreteEvent {
        let raw = RawEvent::new(anchor_type)
            .with_field("session_id", session_id)
            .with_field("wall_clock", display_now());
        self.stamp(raw)
    }

    pub fn stamped_count(&self) -> u64 {
        self.stamped.load(Ordering::Relaxed)
    }

    pub fn provenance(&self) -> Provenance {
        self.clock.provenance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, WallClockFallbackSource};
    use std::time::{SystemTime, UNIX_EPOCH};
    use syncline_core::ReferenceTime;

    #[test]
    fn test_stamp_uses_reference_clock() {
        let clock = Arc::new(ManualClock::new(42.5));
        let stamper = EventTimestamper::new(clock);

        let ev = stamper.stamp(RawEvent::new("button_click").with_field("id", "next"));
        assert_eq!(ev.reference_timestamp, ReferenceTime(42.5));
        assert_eq!(ev.provenance, Provenance::ReferenceClock);
        assert!(ev.display_timestamp.is_some());
        assert_eq!(ev.payload["id"], "next");
        assert_eq!(stamper.stamped_count(), 1);
    }

    #[test]
    fn test_surface_display_timestamp_is_kept() {
        let stamper = EventTimestamper::new(Arc::new(ManualClock::new(1.0)));
        let mut raw = RawEvent::new("page_loaded");
        raw.display_timestamp = Some("2024-01-01T12:00:00".into());

        let ev = stamper.stamp(raw);
        assert_eq!(ev.display_timestamp.as_deref(), Some("2024-01-01T12:00:00"));
    }

    #[test]
    fn test_fallback_stamps_wall_clock_and_flags() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64();
        let stamper = EventTimestamper::new(Arc::new(WallClockFallbackSource::new()));
        let ev = stamper.stamp(RawEvent::new("button_click"));
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64();

        assert_eq!(ev.provenance, Provenance::WallClockFallback);
        let t = ev.reference_timestamp.as_secs_f64();
        assert!(t >= before && t <= after);
    }

    #[test]
    fn test_fallback_with_manual_clock_equals_reading() {
        let stamper = EventTimestamper::new(Arc::new(ManualClock::fallback(1_700_000_000.25)));
        let ev = stamper.stamp(RawEvent::new("x"));
        assert_eq!(ev.reference_timestamp, ReferenceTime(1_700_000_000.25));
        assert!(!ev.provenance.is_alignable());
    }

    #[test]
    fn test_anchor_carries_its_timestamp() {
        let stamper = EventTimestamper::new(Arc::new(ManualClock::new(680.8)));
        let ev = stamper.stamp_anchor(event_types::VIDEO_RECORDING_STARTED, "s1");

        assert_eq!(ev.anchor_payload_timestamp(), Some(ReferenceTime(680.8)));
        assert_eq!(ev.payload["session_id"], "s1");
        assert!(ev.payload.contains_key("wall_clock"));
    }
}
