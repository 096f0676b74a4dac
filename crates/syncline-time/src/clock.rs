//! Clock sources for Syncline
//!
//! The reference clock is optional infrastructure: when the synchronization
//! library is present every component stamps from it, otherwise everything
//! degrades to the wall clock. The choice is made once, at startup, and the
//! chosen source is injected into the collector and the timestamper.

use std::sync::{Arc, OnceLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use syncline_core::{ClockDomain, Provenance, ReferenceTime};

/// Name of the shared reference clock domain
pub const REFERENCE_CLOCK_NAME: &str = "reference_clock";
/// Name of the wall clock domain
pub const WALL_CLOCK_NAME: &str = "wall_clock";

/// A readable clock in some time domain
pub trait ClockSource: Send + Sync {
    /// Current reading
    fn now(&self) -> ReferenceTime;

    /// Static description of this clock's domain
    fn describe(&self) -> ClockDomain;

    /// Provenance attached to timestamps taken from this clock
    fn provenance(&self) -> Provenance;
}

fn process_epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Reference clock - monotonic, shared by every stream of the process
/// INVARIANT: readings never decrease
#[derive(Clone, Copy, Debug)]
pub struct ReferenceClockSource {
    epoch: Instant,
}

impl ReferenceClockSource {
    pub fn new() -> Self {
        ReferenceClockSource {
            epoch: process_epoch(),
        }
    }
}

impl Default for ReferenceClockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for ReferenceClockSource {
    fn now(&self) -> ReferenceTime {
        ReferenceTime(self.epoch.elapsed().as_secs_f64())
    }

    fn describe(&self) -> ClockDomain {
        ClockDomain::new(
            REFERENCE_CLOCK_NAME,
            true,
            "monotonic seconds since the recorder process clock epoch",
        )
    }

    fn provenance(&self) -> Provenance {
        Provenance::ReferenceClock
    }
}

/// Wall clock - UNIX seconds, used when no reference clock is available
#[derive(Clone, Copy, Debug, Default)]
pub struct WallClockFallbackSource;

impl WallClockFallbackSource {
    pub fn new() -> Self {
        WallClockFallbackSource
    }
}

impl ClockSource for WallClockFallbackSource {
    fn now(&self) -> ReferenceTime {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        ReferenceTime(secs)
    }

    fn describe(&self) -> ClockDomain {
        ClockDomain::new(
            WALL_CLOCK_NAME,
            false,
            "UNIX epoch wall clock; not alignable across devices",
        )
    }

    fn provenance(&self) -> Provenance {
        Provenance::WallClockFallback
    }
}

/// Manually driven clock for deterministic tests and replays
#[derive(Debug)]
pub struct ManualClock {
    value: Mutex<ReferenceTime>,
    provenance: Provenance,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock {
            value: Mutex::new(ReferenceTime(start)),
            provenance: Provenance::ReferenceClock,
        }
    }

    /// A manual clock that reports itself as the wall-clock fallback
    pub fn fallback(start: f64) -> Self {
        ManualClock {
            value: Mutex::new(ReferenceTime(start)),
            provenance: Provenance::WallClockFallback,
        }
    }

    pub fn set(&self, secs: f64) {
        *self.value.lock() = ReferenceTime(secs);
    }

    /// Advance by `secs`, returning the new reading
    pub fn advance(&self, secs: f64) -> ReferenceTime {
        let mut value = self.value.lock();
        *value = value.offset_by(secs);
        *value
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> ReferenceTime {
        *self.value.lock()
    }

    fn describe(&self) -> ClockDomain {
        let name = match self.provenance {
            Provenance::ReferenceClock => REFERENCE_CLOCK_NAME,
            Provenance::WallClockFallback => WALL_CLOCK_NAME,
        };
        ClockDomain::new(name, self.provenance.is_alignable(), "manually driven")
    }

    fn provenance(&self) -> Provenance {
        self.provenance
    }
}

/// Pick the clock for this process, once.
/// Falls back to the wall clock when the reference clock is unavailable.
pub fn select_clock_source(reference_available: bool) -> Arc<dyn ClockSource> {
    if reference_available {
        tracing::debug!("using monotonic reference clock");
        Arc::new(ReferenceClockSource::new())
    } else {
        tracing::warn!(
            "reference clock unavailable; timestamps fall back to the wall clock and cannot be aligned across devices"
        );
        Arc::new(WallClockFallbackSource::new())
    }
}

/// Current wall clock as an RFC 3339 string, for display only
pub fn display_now() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_clock_monotonic() {
        let clock = ReferenceClockSource::new();

        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = clock.now();

        assert!(t2 > t1);
    }

    #[test]
    fn test_reference_clocks_share_epoch() {
        let a = ReferenceClockSource::new();
        let b = ReferenceClockSource::new();
        let (ta, tb) = (a.now(), b.now());
        assert!((tb - ta).abs() < 0.1);
    }

    #[test]
    fn test_wall_clock_is_unix_seconds() {
        let clock = WallClockFallbackSource::new();
        // Sometime after 2020-01-01
        assert!(clock.now().as_secs_f64() > 1_577_836_800.0);
        assert_eq!(clock.provenance(), Provenance::WallClockFallback);
        assert!(!clock.describe().is_monotonic);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(10.0);
        assert_eq!(clock.advance(0.5), ReferenceTime(10.5));
        clock.set(3.0);
        assert_eq!(clock.now(), ReferenceTime(3.0));
    }

    #[test]
    fn test_select_clock_source() {
        let reference = select_clock_source(true);
        assert_eq!(reference.provenance(), Provenance::ReferenceClock);
        assert_eq!(reference.describe().name, REFERENCE_CLOCK_NAME);

        let fallback = select_clock_source(false);
        assert_eq!(fallback.provenance(), Provenance::WallClockFallback);
        assert_eq!(fallback.describe().name, WALL_CLOCK_NAME);
    }

    #[test]
    fn test_display_now_is_rfc3339() {
        let shown = display_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&shown).is_ok(), "{shown}");
    }
}
