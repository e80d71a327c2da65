//! Virtual clock environment.
//!
//! `SimEnv` implements `Environment` over a manually advanced clock, so
//! debounce windows and timestamp clamping are reproducible. Clones share
//! the same clock; advancing through any handle advances all of them.

use std::{
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use tidemark_core::Environment;

/// Virtual monotonic instant: elapsed time since simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

#[derive(Debug, Default)]
struct SimClock {
    elapsed: Duration,
    unix_ms: i64,
}

/// Simulation environment with a manually advanced clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    clock: Arc<Mutex<SimClock>>,
}

impl SimEnv {
    /// Create an environment at elapsed zero and unix time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment with the wall clock at `unix_ms`.
    pub fn at(unix_ms: i64) -> Self {
        let env = Self::new();
        env.set_unix_millis(unix_ms);
        env
    }

    /// Advance both clocks by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut clock = self.clock.lock().unwrap();
        clock.elapsed += delta;
        clock.unix_ms += i64::try_from(delta.as_millis()).unwrap_or(i64::MAX);
    }

    /// Set the wall clock without touching the monotonic clock.
    ///
    /// Lets tests skew the wall clock backwards to exercise timestamp
    /// clamping.
    pub fn set_unix_millis(&self, unix_ms: i64) {
        self.clock.lock().unwrap().unix_ms = unix_ms;
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> Self::Instant {
        SimInstant(self.clock.lock().unwrap().elapsed)
    }

    fn unix_millis(&self) -> i64 {
        self.clock.lock().unwrap().unix_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::at(1_000);
        let other = env.clone();
        env.advance(Duration::from_millis(250));

        assert_eq!(other.unix_millis(), 1_250);
        assert_eq!(other.now(), env.now());
    }

    #[test]
    fn wall_clock_skews_independently() {
        let env = SimEnv::at(1_000);
        let before = env.now();
        env.set_unix_millis(500);

        assert_eq!(env.unix_millis(), 500);
        assert_eq!(env.now(), before);
    }
}
