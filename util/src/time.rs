//! Monotonic time for expiry decisions and token accounting
//!
//! All timing in Rampart is expressed as a [Timestamp]: nanoseconds since some arbitrary,
//! process local epoch. Wall clock time is never used; a [Clock] only has to be monotonic.

use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A point in time, as nanoseconds since the epoch of the [Clock] that produced it
///
/// Timestamps from different clocks must not be compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Time passed between `earlier` and `self`; zero if `earlier` is actually later
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use rampart_util::time::Timestamp;
    ///
    /// let a = Timestamp::from_nanos(1_000);
    /// let b = Timestamp::from_nanos(1_500);
    /// assert_eq!(b.saturating_duration_since(a), Duration::from_nanos(500));
    /// assert_eq!(a.saturating_duration_since(b), Duration::ZERO);
    /// ```
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Nanoseconds passed between `earlier` and `self`; zero if `earlier` is actually later
    pub fn saturating_nanos_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    /// Saturates at the end of representable time
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration_to_nanos(rhs)))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

/// Converts a duration to nanoseconds, saturating at [u64::MAX] (roughly 584 years)
pub fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// A monotonic source of [Timestamp]s
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// The system's monotonic clock, measured from the moment the timebase was created
#[derive(Clone, Copy, Debug)]
pub struct Timebase(Instant);

impl Default for Timebase {
    fn default() -> Self {
        Self(Instant::now())
    }
}

impl Timebase {
    /// Time since this timebase was created
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

impl Clock for Timebase {
    fn now(&self) -> Timestamp {
        Timestamp(duration_to_nanos(self.0.elapsed()))
    }
}

/// A clock that only moves when told to
///
/// Shared through an [Arc], this lets tests and simulations control the passage of time for
/// every component holding a clone.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use rampart_util::time::{Clock, ManualClock, Timestamp};
///
/// let clock = Arc::new(ManualClock::default());
/// let held_elsewhere = clock.clone();
///
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(held_elsewhere.now(), Timestamp::from_nanos(2_000_000_000));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self(AtomicU64::new(start.0))
    }

    /// Moves the clock forward by `d`, saturating at the end of representable time
    pub fn advance(&self, d: Duration) {
        let nanos = duration_to_nanos(d);
        // fetch_update only fails if the closure returns None
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(nanos))
            });
    }

    /// Moves the clock to `t`; going backwards is ignored to keep the clock monotonic
    pub fn set(&self, t: Timestamp) {
        self.0.fetch_max(t.0, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_is_monotonic() {
        let tb = Timebase::default();
        let a = tb.now();
        std::thread::sleep(Duration::from_millis(1));
        let b = tb.now();
        assert!(b > a);
        assert!(b - a >= Duration::from_millis(1));
    }

    #[test]
    fn manual_clock_only_moves_forward() {
        let clock = ManualClock::new(Timestamp::from_nanos(10));
        clock.advance(Duration::from_nanos(5));
        assert_eq!(clock.now().as_nanos(), 15);

        clock.set(Timestamp::from_nanos(3));
        assert_eq!(clock.now().as_nanos(), 15);

        clock.set(Timestamp::from_nanos(100));
        assert_eq!(clock.now().as_nanos(), 100);
    }

    #[test]
    fn arithmetic_saturates() {
        let end = Timestamp::from_nanos(u64::MAX - 1);
        assert_eq!((end + Duration::from_secs(1)).as_nanos(), u64::MAX);
        assert_eq!(Timestamp::ZERO - end, Duration::ZERO);
        assert_eq!(duration_to_nanos(Duration::MAX), u64::MAX);
    }
}
