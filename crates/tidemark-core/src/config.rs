//! Engine configuration.
//!
//! Every threshold the original heuristics hardcoded is configuration here:
//! the right values are platform- and device-dependent, so callers tune them
//! and the defaults only encode a reasonable phone-sized starting point.

use std::time::Duration;

/// Distance from the top edge, in pixels, that counts as "near top" and
/// triggers a backward history load.
pub const DEFAULT_NEAR_TOP_THRESHOLD: f64 = 80.0;

/// Distance from the bottom edge, in pixels, within which the reader is
/// considered to be following the newest message.
pub const DEFAULT_NEAR_BOTTOM_THRESHOLD: f64 = 40.0;

/// Viewport height shrink, in pixels, above which the on-screen keyboard is
/// presumed visible.
pub const DEFAULT_INSET_THRESHOLD: f64 = 150.0;

/// Minimum interval between inset emissions during continuous resizes.
pub const DEFAULT_INSET_DEBOUNCE: Duration = Duration::from_millis(100);

/// Attempts to observe a settled layout before giving up on an anchor
/// correction.
pub const DEFAULT_ANCHOR_MAX_ATTEMPTS: u32 = 3;

/// Thread engine configuration.
#[derive(Debug, Clone)]
pub struct ThreadConfig {
    /// Scroll offset at or below which a history load is triggered.
    pub near_top_threshold: f64,
    /// Bottom distance within which tail appends keep the view pinned.
    pub near_bottom_threshold: f64,
    /// Baseline height delta that flips the keyboard-visible flag.
    pub inset_threshold: f64,
    /// Debounce window for viewport inset emissions.
    pub inset_debounce: Duration,
    /// Bounded retry budget for scroll-anchor measurements.
    pub anchor_max_attempts: u32,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            near_top_threshold: DEFAULT_NEAR_TOP_THRESHOLD,
            near_bottom_threshold: DEFAULT_NEAR_BOTTOM_THRESHOLD,
            inset_threshold: DEFAULT_INSET_THRESHOLD,
            inset_debounce: DEFAULT_INSET_DEBOUNCE,
            anchor_max_attempts: DEFAULT_ANCHOR_MAX_ATTEMPTS,
        }
    }
}
