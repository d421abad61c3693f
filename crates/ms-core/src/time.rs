//! Simulation time model.
//!
//! # Design
//!
//! Simulated time is a number of seconds since midnight of the first day
//! (`SimTime`, may exceed 86 400 for overnight runs).  The mobsim advances it
//! in fixed steps; the step counter is an integer `Tick` so that
//!
//!   now = start + tick * step
//!
//! is recomputed from scratch on every advance and never accumulates
//! floating-point drift.
//!
//! `SimClock` is the only writer of time.  It is owned by the mobsim loop and
//! handed to engines by value (`SimTime` is `Copy`) inside the per-tick
//! context.  There is no process-wide clock.

use std::cmp::Ordering;
use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// Number of steps taken since the clock was last reset.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimTime ──────────────────────────────────────────────────────────────────

/// A point in simulated time, in seconds since midnight.
///
/// Totally ordered via [`f64::total_cmp`] so it can key `BTreeMap`s and
/// `BinaryHeap`s.  NaN never arises from the arithmetic used in this crate.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn from_secs(secs: f64) -> Self {
        SimTime(secs)
    }

    /// Build a time from hours, minutes and seconds after midnight.
    pub fn from_hms(h: u32, m: u32, s: u32) -> Self {
        SimTime(f64::from(h) * 3_600.0 + f64::from(m) * 60.0 + f64::from(s))
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn max(self, other: SimTime) -> SimTime {
        if other > self { other } else { self }
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    /// `HH:MM:SS`, hours may exceed 23.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.max(0.0).floor() as u64;
        write!(f, "{:02}:{:02}:{:02}", total / 3_600, (total % 3_600) / 60, total % 60)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The mobsim's clock: a start time, a fixed step and a step counter.
///
/// Cheap to copy and holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    start: SimTime,
    step_secs: f64,
    tick: Tick,
}

impl SimClock {
    /// Create a clock at `start` advancing `step_secs` per tick.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `step_secs` is not positive.
    pub fn new(start: SimTime, step_secs: f64) -> Self {
        debug_assert!(step_secs > 0.0, "time step must be positive");
        Self { start, step_secs, tick: Tick::ZERO }
    }

    /// Current time of day.
    #[inline]
    pub fn now(&self) -> SimTime {
        SimTime(self.start.0 + self.tick.0 as f64 * self.step_secs)
    }

    /// Advance by exactly one step.
    #[inline]
    pub fn advance(&mut self) {
        self.tick = self.tick.offset(1);
    }

    /// Rewind to `start`; called once per iteration before the mobsim runs.
    pub fn reset(&mut self, start: SimTime) {
        self.start = start;
        self.tick = Tick::ZERO;
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    #[inline]
    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    #[inline]
    pub fn start(&self) -> SimTime {
        self.start
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tick, self.now())
    }
}
