//! Scroll anchor geometry and policy.
//!
//! Pure math for the two anchoring policies:
//!
//! - **Bottom-follow**: if the reader was within the near-bottom threshold
//!   before a tail append, scroll to the new bottom.
//! - **Anchor-preserve**: after a prepend, shift the offset by exactly the
//!   height the prepend added so the previously visible message stays put.
//!
//! The measure → mutate → remeasure → correct sequence itself is executed by
//! the runtime against the [`crate::Driver`]; this module only decides.
//! Environments where layout is not synchronously observable report an
//! unchanged post-mutation extent, which planning surfaces as
//! [`PrependOutcome::NotSettled`] so the runtime can retry within the
//! configured attempt budget.

use tidemark_core::ThreadConfig;

/// Measured geometry of a scrollable region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Total content height in pixels.
    pub content_height: f64,
    /// Visible viewport height in pixels.
    pub viewport_height: f64,
}

/// Scroll destination the runtime applies through the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollTarget {
    /// Pin to the newest content.
    Bottom,
    /// Absolute offset in pixels from the top of the content.
    Offset(f64),
}

/// Result of planning an anchor-preserve correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrependOutcome {
    /// Apply this target; the correction is complete.
    Corrected(ScrollTarget),
    /// The layout has not absorbed the mutation yet; measure again.
    NotSettled,
}

/// Scroll anchor policy, configured once per thread.
#[derive(Debug, Clone)]
pub struct ScrollAnchor {
    near_bottom_threshold: f64,
    max_attempts: u32,
}

impl ScrollAnchor {
    /// Create a policy from the thread configuration.
    pub fn new(config: &ThreadConfig) -> Self {
        Self {
            near_bottom_threshold: config.near_bottom_threshold,
            max_attempts: config.anchor_max_attempts,
        }
    }

    /// Bounded retry budget for unsettled layouts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the reader is following the newest content.
    ///
    /// Content shorter than the viewport always counts as near bottom.
    pub fn is_near_bottom(&self, offset: f64, extent: Extent) -> bool {
        let bottom_gap = extent.content_height - (offset + extent.viewport_height);
        bottom_gap <= self.near_bottom_threshold
    }

    /// Plan the scroll after a tail append.
    ///
    /// `pre_offset` and `pre` are measured before the new content is
    /// painted. Returns `Some(Bottom)` only when the reader was already
    /// following the bottom; otherwise the reader is catching up on history
    /// and must not be yanked down.
    pub fn plan_append(&self, pre_offset: f64, pre: Extent) -> Option<ScrollTarget> {
        self.is_near_bottom(pre_offset, pre).then_some(ScrollTarget::Bottom)
    }

    /// Plan the scroll after a prepend.
    ///
    /// New offset = old offset + (post content height − pre content
    /// height), so the message at the old offset stays visually fixed. An
    /// unchanged content height means the layout has not applied the
    /// mutation yet.
    pub fn plan_prepend(&self, pre: Extent, post: Extent, pre_offset: f64) -> PrependOutcome {
        let delta = post.content_height - pre.content_height;
        if delta.abs() < f64::EPSILON {
            return PrependOutcome::NotSettled;
        }
        PrependOutcome::Corrected(ScrollTarget::Offset(pre_offset + delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> ScrollAnchor {
        ScrollAnchor::new(&ThreadConfig::default())
    }

    fn extent(content: f64, viewport: f64) -> Extent {
        Extent { content_height: content, viewport_height: viewport }
    }

    #[test]
    fn near_bottom_within_threshold() {
        let anchor = anchor();
        // 1000px content, 600px viewport: bottom is at offset 400.
        assert!(anchor.is_near_bottom(400.0, extent(1000.0, 600.0)));
        assert!(anchor.is_near_bottom(370.0, extent(1000.0, 600.0)));
        assert!(!anchor.is_near_bottom(200.0, extent(1000.0, 600.0)));
    }

    #[test]
    fn short_content_is_always_near_bottom() {
        assert!(anchor().is_near_bottom(0.0, extent(300.0, 600.0)));
    }

    #[test]
    fn append_follows_only_when_following() {
        let anchor = anchor();
        assert_eq!(
            anchor.plan_append(400.0, extent(1000.0, 600.0)),
            Some(ScrollTarget::Bottom)
        );
        // Reader is up in history; leave them there.
        assert_eq!(anchor.plan_append(50.0, extent(1000.0, 600.0)), None);
    }

    #[test]
    fn prepend_shifts_offset_by_added_height() {
        let anchor = anchor();
        let pre = extent(1000.0, 600.0);
        let post = extent(1240.0, 600.0);

        assert_eq!(
            anchor.plan_prepend(pre, post, 120.0),
            PrependOutcome::Corrected(ScrollTarget::Offset(360.0))
        );
    }

    #[test]
    fn unchanged_extent_means_not_settled() {
        let anchor = anchor();
        let pre = extent(1000.0, 600.0);
        assert_eq!(anchor.plan_prepend(pre, pre, 120.0), PrependOutcome::NotSettled);
    }
}
