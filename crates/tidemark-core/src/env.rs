//! Environment abstraction for deterministic testing.
//!
//! Decouples engine logic from system time. Production uses the real clock;
//! the harness substitutes virtual time so debounce windows and anchor
//! retries are reproducible.

use std::time::Duration;

/// Abstract environment providing time.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
/// - `unix_millis()` may be skewed or jump; consumers that need ordering
///   must clamp (the send coordinator clamps optimistic timestamps to the
///   current tail).
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Current wall-clock time in unix milliseconds.
    ///
    /// Used to stamp optimistic messages so they sort with confirmed
    /// history on a well-behaved clock.
    fn unix_millis(&self) -> i64;
}
