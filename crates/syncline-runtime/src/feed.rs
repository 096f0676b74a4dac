//! Host-fed pointer position stream
//!
//! The host samples the cursor itself, so positions are stamped from the
//! reference clock at push time and queued until the recorder polls them.
//! The stream is local: it reports no clock offset.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use syncline_core::{MouseAction, StreamInfo, SyncResult};
use syncline_time::{ClockSource, PulledSample, StreamSource};

/// Default name of the pointer position stream
pub const POSITION_STREAM_NAME: &str = "MouseTracking";
/// Stream type of the pointer position stream
pub const POSITION_STREAM_TYPE: &str = "Mouse";
/// Host sampling rate of the position stream (Hz)
pub const POSITION_NOMINAL_RATE: f64 = 10.0;

const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Push side, cloneable across host threads
#[derive(Clone)]
pub struct PositionFeed {
    queue: Arc<Mutex<VecDeque<PulledSample>>>,
    clock: Arc<dyn ClockSource>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

/// Poll side, handed to the recorder
pub struct PositionSource {
    info: StreamInfo,
    queue: Arc<Mutex<VecDeque<PulledSample>>>,
}

impl PositionFeed {
    pub fn new(clock: Arc<dyn ClockSource>) -> (Self, PositionSource) {
        Self::with_capacity(clock, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(clock: Arc<dyn ClockSource>, capacity: usize) -> (Self, PositionSource) {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let info = StreamInfo::new(POSITION_STREAM_NAME, POSITION_STREAM_TYPE, 3)
            .with_nominal_rate(POSITION_NOMINAL_RATE);
        let feed = PositionFeed {
            queue: queue.clone(),
            clock,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (feed, PositionSource { info, queue })
    }

    /// Queue one `[x, y, action]` sample. Returns false when the queue is full.
    pub fn push(&self, action: MouseAction, x: f64, y: f64) -> bool {
        let sample = PulledSample::at(action.position_payload(x, y), self.clock.now());
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            drop(queue);
            if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                tracing::warn!(capacity = self.capacity, "position queue full; dropping samples");
            }
            return false;
        }
        queue.push_back(sample);
        true
    }

    /// Queue a sample for a host event name (`mouse_press`, ...)
    pub fn push_event(&self, event_name: &str, x: f64, y: f64) -> bool {
        self.push(MouseAction::from_event_name(event_name), x, y)
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl StreamSource for PositionSource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn pull_sample(&mut self) -> SyncResult<Option<PulledSample>> {
        Ok(self.queue.lock().pop_front())
    }

    fn time_correction(&mut self) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncline_core::{Payload, ReferenceTime};
    use syncline_time::ManualClock;

    #[test]
    fn test_positions_stamped_at_push() {
        let clock = Arc::new(ManualClock::new(5.0));
        let (feed, mut source) = PositionFeed::new(clock.clone());

        feed.push(MouseAction::Position, 0.1, 0.2);
        clock.advance(0.1);
        feed.push_event("mouse_press", 0.3, 0.4);
        clock.advance(1.0);

        let first = source.pull_sample().unwrap().unwrap();
        assert_eq!(first.timestamp, Some(ReferenceTime(5.0)));
        let second = source.pull_sample().unwrap().unwrap();
        assert_eq!(second.payload, Payload::Numeric(vec![0.3, 0.4, 1.0]));
        assert!(source.pull_sample().unwrap().is_none());
        assert!(source.time_correction().is_none());
    }

    #[test]
    fn test_full_queue_drops() {
        let (feed, _source) = PositionFeed::with_capacity(Arc::new(ManualClock::new(0.0)), 2);
        assert!(feed.push(MouseAction::Move, 0.0, 0.0));
        assert!(feed.push(MouseAction::Move, 0.0, 0.0));
        assert!(!feed.push(MouseAction::Move, 0.0, 0.0));
        assert_eq!(feed.pending(), 2);
        assert_eq!(feed.dropped(), 1);
    }
}
