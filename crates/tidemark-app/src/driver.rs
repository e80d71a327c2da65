//! Platform driver seam.
//!
//! [`Driver`] is the boundary between the pure thread engine and everything
//! platform-specific: input events, layout measurement, scrolling, and
//! rendering. Production drivers wrap a real UI surface; the harness driver
//! scripts measurements and records scrolls so anchor corrections can be
//! asserted exactly.

use std::future::Future;

use tidemark_core::{Environment, RoomId};

use crate::{
    anchor::{Extent, ScrollTarget},
    event::ThreadEvent,
    thread::Thread,
};

/// Platform I/O driver for the runtime loop.
pub trait Driver: Send {
    /// Driver-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Resolves to `Ok(None)` when the input stream is closed; the runtime
    /// treats that as shutdown.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<ThreadEvent>, Self::Error>> + Send;

    /// Measured geometry of a room's scrollable content.
    ///
    /// `None` when the layout is not yet observable (first mount, mutation
    /// not painted). The runtime retries within the configured attempt
    /// budget.
    fn content_extent(&mut self, room: &RoomId) -> Option<Extent>;

    /// Current scroll offset of a room's viewport, in pixels from the top.
    fn scroll_offset(&mut self, room: &RoomId) -> f64;

    /// Apply a scroll target to a room's viewport.
    fn apply_scroll(
        &mut self,
        room: &RoomId,
        target: ScrollTarget,
    ) -> Result<(), Self::Error>;

    /// Yield until the platform has had a chance to apply pending layout.
    fn next_frame(&mut self) -> impl Future<Output = ()> + Send;

    /// Render the thread state.
    fn render<E: Environment>(&mut self, thread: &Thread<E>) -> Result<(), Self::Error>;

    /// Tear the driver down on shutdown.
    fn stop(&mut self);
}
