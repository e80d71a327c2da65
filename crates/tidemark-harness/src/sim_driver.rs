//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` stands in for a real UI surface so the same
//! `tidemark_app::Runtime` orchestration code runs in tests. Layout is
//! modeled as fixed-height rows: content height is `row_height` times the
//! message count at the last render, which makes the measure, mutate,
//! remeasure sequence behave like a real layout pass. A settle delay can be
//! configured to model platforms where mutations are not observable until a
//! later frame.
//!
//! Clones share state, so a test keeps one handle for injection and
//! assertions while the runtime owns another.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use tidemark_app::{Driver, Extent, ScrollTarget, Thread, ThreadEvent};
use tidemark_core::{Environment, RoomId};
use tokio::sync::Notify;

use crate::invariants::{InvariantRegistry, ThreadSnapshot};

/// Error type for the simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

struct Surface {
    events: VecDeque<ThreadEvent>,
    closed: bool,
    row_height: f64,
    viewport_height: f64,
    // Message counts as of the last settled layout, per room.
    laid_out: HashMap<RoomId, usize>,
    // Rendered counts waiting out the settle delay.
    staged: Option<(HashMap<RoomId, usize>, usize)>,
    settle_frames: usize,
    offsets: HashMap<RoomId, f64>,
    scrolls: Vec<(RoomId, ScrollTarget)>,
    renders: usize,
    stopped: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
            closed: false,
            row_height: 40.0,
            viewport_height: 600.0,
            laid_out: HashMap::new(),
            staged: None,
            settle_frames: 0,
            offsets: HashMap::new(),
            scrolls: Vec::new(),
            renders: 0,
            stopped: false,
        }
    }
}

impl Surface {
    fn extent(&self, room: &RoomId) -> Option<Extent> {
        let count = *self.laid_out.get(room)?;
        Some(Extent {
            content_height: self.row_height * count as f64,
            viewport_height: self.viewport_height,
        })
    }
}

/// Simulation driver for deterministic testing.
#[derive(Clone, Default)]
pub struct SimDriver {
    surface: Arc<Mutex<Surface>>,
    wake: Arc<Notify>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl SimDriver {
    /// Create a driver with default geometry (40px rows, 600px viewport).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Inject an event for the runtime to process.
    pub fn inject(&self, event: ThreadEvent) {
        self.surface.lock().unwrap().events.push_back(event);
        // notify_one stores a permit, so a poll that has not registered yet
        // still observes the wakeup.
        self.wake.notify_one();
    }

    /// Close the event stream once the queue drains; the runtime treats the
    /// closed stream as shutdown.
    pub fn close(&self) {
        self.surface.lock().unwrap().closed = true;
        self.wake.notify_one();
    }

    /// Set the modeled row height in pixels.
    pub fn set_row_height(&self, height: f64) {
        self.surface.lock().unwrap().row_height = height;
    }

    /// Set the modeled viewport height in pixels.
    pub fn set_viewport_height(&self, height: f64) {
        self.surface.lock().unwrap().viewport_height = height;
    }

    /// Delay layout settling by `frames` calls to `next_frame`.
    pub fn set_settle_frames(&self, frames: usize) {
        self.surface.lock().unwrap().settle_frames = frames;
    }

    /// Recorded scrolls in application order.
    pub fn scrolls(&self) -> Vec<(RoomId, ScrollTarget)> {
        self.surface.lock().unwrap().scrolls.clone()
    }

    /// Current modeled offset for a room.
    pub fn offset(&self, room: &RoomId) -> f64 {
        self.surface.lock().unwrap().offsets.get(room).copied().unwrap_or(0.0)
    }

    /// Number of renders so far.
    pub fn render_count(&self) -> usize {
        self.surface.lock().unwrap().renders
    }

    /// Whether the driver was stopped.
    pub fn stopped(&self) -> bool {
        self.surface.lock().unwrap().stopped
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<ThreadEvent>, Self::Error> {
        loop {
            let wake = self.wake.notified();
            {
                let mut surface = self.surface.lock().unwrap();
                if let Some(event) = surface.events.pop_front() {
                    // The viewport is the source of these reports; mirror
                    // them into the modeled geometry.
                    match &event {
                        ThreadEvent::ScrollPositionChanged { room, offset } => {
                            surface.offsets.insert(room.clone(), *offset);
                        },
                        ThreadEvent::ViewportResized { height } => {
                            surface.viewport_height = *height;
                        },
                        _ => {},
                    }
                    return Ok(Some(event));
                }
                if surface.closed {
                    return Ok(None);
                }
            }
            wake.await;
        }
    }

    fn content_extent(&mut self, room: &RoomId) -> Option<Extent> {
        self.surface.lock().unwrap().extent(room)
    }

    fn scroll_offset(&mut self, room: &RoomId) -> f64 {
        self.surface.lock().unwrap().offsets.get(room).copied().unwrap_or(0.0)
    }

    fn apply_scroll(&mut self, room: &RoomId, target: ScrollTarget) -> Result<(), Self::Error> {
        let mut surface = self.surface.lock().unwrap();
        let offset = match target {
            ScrollTarget::Bottom => surface
                .extent(room)
                .map_or(0.0, |e| (e.content_height - e.viewport_height).max(0.0)),
            ScrollTarget::Offset(offset) => offset,
        };
        surface.offsets.insert(room.clone(), offset);
        surface.scrolls.push((room.clone(), target));
        Ok(())
    }

    async fn next_frame(&mut self) {
        let mut surface = self.surface.lock().unwrap();
        if let Some((counts, remaining)) = surface.staged.take() {
            if remaining <= 1 {
                surface.laid_out = counts;
            } else {
                surface.staged = Some((counts, remaining - 1));
            }
        }
    }

    fn render<E: Environment>(&mut self, thread: &Thread<E>) -> Result<(), Self::Error> {
        let counts: HashMap<RoomId, usize> =
            thread.store().rooms().map(|(room, log)| (room.clone(), log.len())).collect();

        {
            let mut surface = self.surface.lock().unwrap();
            surface.renders += 1;
            if surface.settle_frames == 0 {
                surface.laid_out = counts;
            } else {
                let frames = surface.settle_frames;
                surface.staged = Some((counts, frames));
            }
        }

        if let Some(registry) = &self.invariants {
            registry.assert_all(&ThreadSnapshot::capture(thread), "at render");
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.surface.lock().unwrap().stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_events_come_back_in_order() {
        let mut driver = SimDriver::new();
        let handle = driver.clone();
        handle.inject(ThreadEvent::RoomOpened { room: RoomId::from("r1") });
        handle.inject(ThreadEvent::Shutdown);

        assert_eq!(
            driver.poll_event().await.unwrap(),
            Some(ThreadEvent::RoomOpened { room: RoomId::from("r1") })
        );
        assert_eq!(driver.poll_event().await.unwrap(), Some(ThreadEvent::Shutdown));
    }

    #[tokio::test]
    async fn closed_drained_stream_returns_none() {
        let mut driver = SimDriver::new();
        driver.close();
        assert_eq!(driver.poll_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn scroll_reports_update_geometry() {
        let mut driver = SimDriver::new();
        let room = RoomId::from("r1");
        driver.inject(ThreadEvent::ScrollPositionChanged { room: room.clone(), offset: 120.0 });
        driver.poll_event().await.unwrap();

        assert!((driver.scroll_offset(&room) - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn extent_is_unmeasurable_before_first_render() {
        let mut driver = SimDriver::new();
        assert!(driver.content_extent(&RoomId::from("r1")).is_none());
    }
}
