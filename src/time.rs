// Copyright (c) 2025 OsPort Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time units for the portable layer.
//!
//! Callers express durations in milliseconds; backends count in whatever
//! tick their kernel uses.  The [`Timeout`] type carries the caller's bound
//! and [`Timeout::classify`] turns it into exactly one of the three forms a
//! wait can take: don't block, block for a bounded number of native ticks,
//! or block without bound.  Every wait operation of every primitive goes
//! through this classification, so the three-way contract is identical no
//! matter which backend is active.
//!
//! The millisecond-to-tick conversion rounds *up*.  A bounded wait promises to
//! wait at least as long as requested; on a backend whose tick is coarser
//! than a millisecond, rounding down would silently turn a small positive
//! bound into a non-blocking attempt.

use core::fmt;

/// Native tick count of a backend.
pub type Tick = u64;

/// Millisecond duration used across the portable API.
pub type Duration = fugit::MillisDurationU32;

/// Millisecond instant measured from kernel start.
pub type Instant = fugit::Instant<u64, 1, 1000>;

/// Do not block: attempt the operation once and return immediately.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoWait;

/// Block with no time bound.
#[derive(Clone, Copy, Default, Debug)]
pub struct Forever;

/// A caller-supplied bound on a blocking operation.
///
/// Built via `Into<Timeout>` from [`NoWait`], [`Forever`], or a
/// [`Duration`].  A zero duration is the same thing as [`NoWait`]: attempt
/// once, return immediately.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Attempt once and return immediately.
    NoWait,
    /// Block at most this long.
    Bounded(Duration),
    /// Block until the operation completes.
    Forever,
}

impl fmt::Debug for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::NoWait => write!(f, "Timeout::NoWait"),
            Timeout::Bounded(d) => write!(f, "Timeout::Bounded({} ms)", d.to_millis()),
            Timeout::Forever => write!(f, "Timeout::Forever"),
        }
    }
}

impl From<NoWait> for Timeout {
    fn from(_: NoWait) -> Timeout {
        Timeout::NoWait
    }
}

impl From<Forever> for Timeout {
    fn from(_: Forever) -> Timeout {
        Timeout::Forever
    }
}

impl From<Duration> for Timeout {
    fn from(value: Duration) -> Timeout {
        if value.ticks() == 0 {
            Timeout::NoWait
        } else {
            Timeout::Bounded(value)
        }
    }
}

/// A classified wait bound, in the backend's native tick unit.
///
/// This is what backends receive; a kernel with a single "wait n ticks"
/// call maps [`Wait::Immediate`] and [`Wait::Forever`] onto that call's
/// zero-tick and unbounded forms.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Wait {
    /// Attempt once, never block.
    Immediate,
    /// Block at most this many ticks (always non-zero).
    Ticks(Tick),
    /// Block until the operation completes.
    Forever,
}

impl Timeout {
    /// Classify this bound for a backend running at `tick_hz` ticks per
    /// second.
    pub fn classify(self, tick_hz: u32) -> Wait {
        match self {
            Timeout::NoWait => Wait::Immediate,
            Timeout::Forever => Wait::Forever,
            Timeout::Bounded(d) => Wait::Ticks(ms_to_ticks(d.to_millis(), tick_hz)),
        }
    }
}

/// Convert milliseconds to native ticks, rounding up.
///
/// The result is never zero for a non-zero input, preserving the "wait at
/// least this long" contract on coarse-tick backends.
pub const fn ms_to_ticks(ms: u32, tick_hz: u32) -> Tick {
    ((ms as u64) * (tick_hz as u64)).div_ceil(1000)
}

/// Convert native ticks to milliseconds, rounding down.
pub const fn ticks_to_ms(ticks: Tick, tick_hz: u32) -> u64 {
    ticks * 1000 / (tick_hz as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_no_wait() {
        assert_eq!(Timeout::from(Duration::millis(0)), Timeout::NoWait);
    }

    #[test]
    fn classification_is_three_way() {
        assert_eq!(Timeout::from(NoWait).classify(1000), Wait::Immediate);
        assert_eq!(Timeout::from(Forever).classify(1000), Wait::Forever);
        assert_eq!(
            Timeout::from(Duration::millis(25)).classify(1000),
            Wait::Ticks(25)
        );
    }

    #[test]
    fn conversion_rounds_up_on_coarse_ticks() {
        // 100 Hz tick: 10 ms per tick.
        assert_eq!(ms_to_ticks(1, 100), 1);
        assert_eq!(ms_to_ticks(10, 100), 1);
        assert_eq!(ms_to_ticks(11, 100), 2);
        assert_eq!(ms_to_ticks(0, 100), 0);
    }

    #[test]
    fn conversion_is_identity_at_millisecond_ticks() {
        assert_eq!(ms_to_ticks(5, 1000), 5);
        assert_eq!(ticks_to_ms(5, 1000), 5);
    }

    #[test]
    fn ticks_to_ms_rounds_down() {
        assert_eq!(ticks_to_ms(1, 3), 333);
        assert_eq!(ticks_to_ms(3, 3), 1000);
    }

    #[test]
    fn bounded_classification_uses_the_rounding_rule() {
        assert_eq!(
            Timeout::from(Duration::millis(15)).classify(100),
            Wait::Ticks(2)
        );
    }
}
