//! Viewport inset tracking.
//!
//! Watches usable-viewport height notifications and republishes a
//! [`ViewportInset`] when the delta from a captured baseline crosses the
//! configured threshold in either direction. Sub-threshold height changes
//! are silent. Emissions are debounced so continuous resize streams
//! (keyboard slide-in animations) do not thrash consumers; the state
//! settles on the first observation after the debounce window.
//!
//! The tracker is pure layout input: it never mutates message state. Time is
//! passed in, so debounce behavior is deterministic under virtual clocks.

use std::{ops::Sub, time::Duration};

use tidemark_core::ThreadConfig;

/// Published inset value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportInset {
    /// Current usable viewport height in pixels.
    pub usable_height: f64,
    /// True while the height sits more than the threshold below baseline
    /// (on-screen keyboard presumed visible).
    pub is_constrained: bool,
}

/// Usable-viewport height observer.
#[derive(Debug, Clone)]
pub struct InsetTracker<I> {
    threshold: f64,
    debounce: Duration,
    baseline: Option<f64>,
    last_emit: Option<I>,
    current: Option<ViewportInset>,
}

impl<I> InsetTracker<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a tracker from the thread configuration. The baseline is
    /// captured from the first observation.
    pub fn new(config: &ThreadConfig) -> Self {
        Self {
            threshold: config.inset_threshold,
            debounce: config.inset_debounce,
            baseline: None,
            last_emit: None,
            current: None,
        }
    }

    /// Observe a height notification.
    ///
    /// Returns the new inset on the first observation (baseline capture)
    /// and whenever the constrained flag flips, provided the debounce
    /// window has elapsed; sub-threshold height changes are silent. A
    /// height above the current baseline (rotation, chrome dismissed)
    /// raises the baseline.
    pub fn observe(&mut self, height: f64, now: I) -> Option<ViewportInset> {
        let baseline = match self.baseline {
            Some(baseline) if height > baseline => {
                self.baseline = Some(height);
                height
            },
            Some(baseline) => baseline,
            None => {
                self.baseline = Some(height);
                height
            },
        };

        let constrained = baseline - height > self.threshold;

        if let Some(current) = self.current {
            // Only a flip of the constrained flag is worth publishing;
            // height drift within the same state is noise.
            if constrained == current.is_constrained {
                return None;
            }
            if let Some(last) = self.last_emit
                && now - last < self.debounce
            {
                return None;
            }
        }

        let inset = ViewportInset { usable_height: height, is_constrained: constrained };
        self.current = Some(inset);
        self.last_emit = Some(now);
        Some(inset)
    }

    /// Latest published inset. `None` before the first observation.
    pub fn current(&self) -> Option<ViewportInset> {
        self.current
    }

    /// Captured baseline height. `None` before the first observation.
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Virtual instant: milliseconds since an arbitrary origin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Ms(u64);

    impl Sub for Ms {
        type Output = Duration;
        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0 - rhs.0)
        }
    }

    fn tracker() -> InsetTracker<Ms> {
        InsetTracker::new(&ThreadConfig::default())
    }

    #[test]
    fn first_observation_sets_baseline_and_emits() {
        let mut tracker = tracker();
        let inset = tracker.observe(800.0, Ms(0)).unwrap();
        assert_eq!(tracker.baseline(), Some(800.0));
        assert!(!inset.is_constrained);
    }

    #[test]
    fn constrained_flips_above_threshold() {
        let mut tracker = tracker();
        tracker.observe(800.0, Ms(0));

        // Default threshold 150px: 640 is only 160 below baseline.
        let inset = tracker.observe(640.0, Ms(200)).unwrap();
        assert!(inset.is_constrained);

        // Height returns within the threshold of baseline.
        let inset = tracker.observe(790.0, Ms(400)).unwrap();
        assert!(!inset.is_constrained);
    }

    #[test]
    fn small_deltas_do_not_flip() {
        let mut tracker = tracker();
        tracker.observe(800.0, Ms(0));

        // 100px below baseline: under the 150px threshold, same state.
        assert!(tracker.observe(700.0, Ms(200)).is_none());
        // Still silent well past the debounce window: no flip, no emission.
        assert!(tracker.observe(680.0, Ms(400)).is_none());
        assert_eq!(tracker.current().map(|i| i.is_constrained), Some(false));
    }

    #[test]
    fn emissions_are_debounced() {
        let mut tracker = tracker();
        tracker.observe(800.0, Ms(0));

        // Flip arrives mid-animation, inside the 100ms window: suppressed.
        assert!(tracker.observe(600.0, Ms(50)).is_none());

        // Settles once the window has passed.
        let inset = tracker.observe(600.0, Ms(150)).unwrap();
        assert!(inset.is_constrained);
    }

    #[test]
    fn growing_height_raises_baseline() {
        let mut tracker = tracker();
        tracker.observe(800.0, Ms(0));
        tracker.observe(1000.0, Ms(200));
        assert_eq!(tracker.baseline(), Some(1000.0));

        // Constrained is now measured against the new baseline.
        let inset = tracker.observe(840.0, Ms(400)).unwrap();
        assert!(inset.is_constrained);
    }
}
