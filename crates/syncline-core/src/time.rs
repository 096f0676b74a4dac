//! Time primitives for Syncline
//!
//! Every synchronized entity is expressed in one reference clock domain:
//! - Reference time: seconds on the designated reference clock
//! - Relative time: seconds since the session's reference start
//! - Clock offset: seconds between a source clock and the reference clock

use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// Reference time - seconds in the reference clock domain
#[derive(Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTime(pub f64);

impl ReferenceTime {
    pub const ZERO: ReferenceTime = ReferenceTime(0.0);

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        ReferenceTime(secs)
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `origin` (negative if before it)
    #[inline]
    pub fn since(self, origin: ReferenceTime) -> f64 {
        self.0 - origin.0
    }

    /// Shift by a signed number of seconds
    #[inline]
    pub fn offset_by(self, secs: f64) -> Self {
        ReferenceTime(self.0 + secs)
    }

    /// Total order, so NaN never poisons a sort
    #[inline]
    pub fn total_cmp(&self, other: &ReferenceTime) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Sub<ReferenceTime> for ReferenceTime {
    type Output = f64;

    #[inline]
    fn sub(self, rhs: ReferenceTime) -> Self::Output {
        self.0 - rhs.0
    }
}

impl fmt::Debug for ReferenceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref({:.6}s)", self.0)
    }
}

impl fmt::Display for ReferenceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl From<f64> for ReferenceTime {
    fn from(secs: f64) -> Self {
        ReferenceTime(secs)
    }
}

/// A named time reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDomain {
    pub name: String,
    pub is_monotonic: bool,
    /// Free-text description of the clock's origin
    pub epoch_note: String,
}

impl ClockDomain {
    pub fn new(name: impl Into<String>, is_monotonic: bool, epoch_note: impl Into<String>) -> Self {
        ClockDomain {
            name: name.into(),
            is_monotonic,
            epoch_note: epoch_note.into(),
        }
    }
}

/// Position of an entity relative to a secondary timeline's zero point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePosition {
    /// Happened before the secondary timeline began (e.g. off-screen)
    BeforeAnchor,
    /// Exactly at the zero point
    AtAnchor,
    /// Inside the secondary timeline
    AfterAnchor,
    /// Resolved time is NaN; the entity cannot be placed
    Unresolved,
}

impl TimelinePosition {
    pub fn classify(resolved_time: f64) -> Self {
        if resolved_time.is_nan() {
            TimelinePosition::Unresolved
        } else if resolved_time < 0.0 {
            TimelinePosition::BeforeAnchor
        } else if resolved_time == 0.0 {
            TimelinePosition::AtAnchor
        } else {
            TimelinePosition::AfterAnchor
        }
    }

    #[inline]
    pub fn is_visible(self) -> bool {
        matches!(self, TimelinePosition::AtAnchor | TimelinePosition::AfterAnchor)
    }
}
