//! Production environment.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tidemark_core::Environment;

/// Environment backed by the system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> i64 {
        // A clock before the epoch stamps 0; the store clamps against the
        // tail anyway.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}
