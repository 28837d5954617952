//! Logical-time primitives: [`Instant`], [`Interval`] and [`Tag`].
//!
//! `Instant` is signed nanoseconds relative to the scheduler's start time, so
//! that negative offsets (a clamped or malformed delay) are representable
//! rather than wrapping, matching the `instant_t`/`interval_t` pair of the
//! original C runtime this crate reimplements.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Nanoseconds since the scheduler's physical start time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Instant(i64);

/// A signed duration between two [`Instant`]s. May be negative.
pub type Interval = i64;

impl Instant {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i64::MAX);

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Saturating offset by `delta` nanoseconds; never overflows.
    pub fn saturating_add(self, delta: Interval) -> Self {
        Self(self.0.saturating_add(delta))
    }

    /// The (possibly negative) interval from `earlier` to `self`.
    pub fn since(self, earlier: Self) -> Interval {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<Duration> for Instant {
    fn from(duration: Duration) -> Self {
        Self(duration.as_nanos().min(i64::MAX as u128) as i64)
    }
}

impl std::fmt::Display for Instant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A `(instant, microstep)` pair totally ordering events in superdense time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub instant: Instant,
    pub microstep: u32,
}

impl Tag {
    /// The tag of the first logical instant.
    pub const ZERO: Self = Self {
        instant: Instant::ZERO,
        microstep: 0,
    };

    /// A tag no real event can reach; used as a sentinel for "no next event".
    pub const FOREVER: Self = Self {
        instant: Instant::MAX,
        microstep: u32::MAX,
    };

    pub fn new(instant: Instant, microstep: u32) -> Self {
        Self { instant, microstep }
    }

    /// A new tag at the same instant, one microstep later (superdense
    /// simultaneity: same physical instant, logically later).
    pub fn next_microstep(&self) -> Self {
        Self {
            instant: self.instant,
            microstep: self.microstep.saturating_add(1),
        }
    }

    /// A new tag `delta` nanoseconds later, at microstep 0.
    pub fn after(&self, delta: Interval) -> Self {
        Self {
            instant: self.instant.saturating_add(delta),
            microstep: 0,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.instant, self.microstep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ordering_is_lexicographic() {
        let a = Tag::new(Instant::from_nanos(10), 5);
        let b = Tag::new(Instant::from_nanos(10), 6);
        let c = Tag::new(Instant::from_nanos(11), 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn next_microstep_keeps_instant() {
        let t = Tag::new(Instant::from_nanos(42), 3);
        let t2 = t.next_microstep();
        assert_eq!(t2.instant, t.instant);
        assert_eq!(t2.microstep, 4);
    }

    #[test]
    fn after_resets_microstep() {
        let t = Tag::new(Instant::from_nanos(42), 3);
        let t2 = t.after(8);
        assert_eq!(t2.instant, Instant::from_nanos(50));
        assert_eq!(t2.microstep, 0);
    }

    #[test]
    fn instant_saturates_instead_of_overflowing() {
        let near_max = Instant::from_nanos(i64::MAX - 1);
        assert_eq!(near_max.saturating_add(100), Instant::MAX);
    }
}
