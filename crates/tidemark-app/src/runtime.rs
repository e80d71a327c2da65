//! Generic runtime for thread orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Thread`]: the pure state machine
//! - [`MessageSource`]: the backing service (history loads, sends)
//! - [`Driver`]: platform-specific I/O (events, layout, scroll, render)
//!
//! Source operations run concurrently: each dispatched load or send becomes
//! an in-flight future whose completion re-enters the state machine as an
//! event. Single-flight pagination is a property of the state machine, not
//! of this loop, so the loop never has to serialize anything itself.

use std::sync::Arc;

use futures::{StreamExt, future::BoxFuture, stream::FuturesUnordered};
use tidemark_core::{Environment, RoomId, ThreadConfig};

use crate::{
    Driver, MessageSource, Thread,
    action::{AnchorDirective, ThreadAction},
    anchor::{PrependOutcome, ScrollAnchor, ScrollTarget},
    event::ThreadEvent,
};

/// Generic runtime that orchestrates Thread, MessageSource, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time
/// - `S`: Backing message source
pub struct Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: MessageSource,
{
    driver: D,
    thread: Thread<E>,
    anchor: ScrollAnchor,
    source: Arc<S>,
    inflight: FuturesUnordered<BoxFuture<'static, ThreadEvent>>,
}

impl<D, E, S> Runtime<D, E, S>
where
    D: Driver,
    E: Environment,
    S: MessageSource,
{
    /// Create a runtime with the given driver, environment, source, and
    /// configuration.
    pub fn new(driver: D, env: E, source: S, config: ThreadConfig) -> Self {
        let anchor = ScrollAnchor::new(&config);
        let thread = Thread::new(env, config);
        Self { driver, thread, anchor, source: Arc::new(source), inflight: FuturesUnordered::new() }
    }

    /// Run the main event loop.
    ///
    /// Polls the driver for input events and the in-flight set for source
    /// completions, feeds each into the state machine, and executes the
    /// resulting actions. Returns when a [`ThreadAction::Quit`] is emitted
    /// or the driver's event stream closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.thread)?;

        loop {
            let event = match self.next_event().await? {
                Some(event) => event,
                None => ThreadEvent::Shutdown,
            };

            let actions = self.thread.handle(event);
            if self.execute(actions).await? {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Wait for the next event from either the driver or an in-flight
    /// source operation.
    ///
    /// Completions drain before new input is accepted, so the ordering of
    /// source results relative to queued input is deterministic.
    async fn next_event(&mut self) -> Result<Option<ThreadEvent>, D::Error> {
        if self.inflight.is_empty() {
            return self.driver.poll_event().await;
        }

        tokio::select! {
            biased;
            Some(event) = self.inflight.next() => Ok(Some(event)),
            event = self.driver.poll_event() => event,
        }
    }

    /// Execute actions produced by the state machine.
    ///
    /// Returns `true` if the runtime should quit. An `Anchor` action is
    /// buffered and applied around the next `Render`, so the measure,
    /// mutate, remeasure sequence brackets exactly one paint.
    async fn execute(&mut self, actions: Vec<ThreadAction>) -> Result<bool, D::Error> {
        let mut pending_anchor: Option<(RoomId, AnchorDirective)> = None;

        for action in actions {
            match action {
                ThreadAction::LoadOlder { room, cursor, generation } => {
                    let source = Arc::clone(&self.source);
                    self.inflight.push(Box::pin(async move {
                        match source.load_older(room.clone(), cursor).await {
                            Ok(batch) => ThreadEvent::PageLoaded { room, batch, generation },
                            Err(error) => ThreadEvent::LoadFailed { room, error, generation },
                        }
                    }));
                },
                ThreadAction::DispatchSend { room, local_id, content } => {
                    let source = Arc::clone(&self.source);
                    self.inflight.push(Box::pin(async move {
                        match source.send(room.clone(), content).await {
                            Ok(message) => ThreadEvent::SendConfirmed { room, local_id, message },
                            Err(error) => ThreadEvent::SendFailed { room, local_id, error },
                        }
                    }));
                },
                ThreadAction::Anchor { room, directive } => {
                    pending_anchor = Some((room, directive));
                },
                ThreadAction::Render => {
                    match pending_anchor.take() {
                        Some((room, directive)) => {
                            self.anchored_render(&room, directive).await?;
                        },
                        None => self.driver.render(&self.thread)?,
                    }
                },
                ThreadAction::Quit => return Ok(true),
            }
        }

        // A directive with no paired render still paints once.
        if let Some((room, directive)) = pending_anchor {
            self.anchored_render(&room, directive).await?;
        }

        Ok(false)
    }

    /// Render with a scroll policy applied around the paint.
    async fn anchored_render(
        &mut self,
        room: &RoomId,
        directive: AnchorDirective,
    ) -> Result<(), D::Error> {
        match directive {
            AnchorDirective::JumpToBottom => {
                self.driver.render(&self.thread)?;
                for _ in 0..self.anchor.max_attempts() {
                    if self.driver.content_extent(room).is_some() {
                        self.driver.apply_scroll(room, ScrollTarget::Bottom)?;
                        return Ok(());
                    }
                    self.driver.next_frame().await;
                }
                // Unmeasurable mount; scroll anyway so an eventual layout
                // lands at the bottom.
                self.driver.apply_scroll(room, ScrollTarget::Bottom)
            },
            AnchorDirective::FollowIfNearBottom => {
                let pre_offset = self.driver.scroll_offset(room);
                let pre = self.driver.content_extent(room);
                self.driver.render(&self.thread)?;

                // Unmeasurable content counts as short content: follow.
                let follow = match pre {
                    Some(extent) => self.anchor.plan_append(pre_offset, extent).is_some(),
                    None => true,
                };
                if follow {
                    self.driver.apply_scroll(room, ScrollTarget::Bottom)?;
                }
                Ok(())
            },
            AnchorDirective::PreservePosition => {
                let pre_offset = self.driver.scroll_offset(room);
                let Some(pre) = self.driver.content_extent(room) else {
                    // Nothing was visible; no position to preserve.
                    return self.driver.render(&self.thread);
                };
                self.driver.render(&self.thread)?;

                for attempt in 0..self.anchor.max_attempts() {
                    let Some(post) = self.driver.content_extent(room) else {
                        self.driver.next_frame().await;
                        continue;
                    };
                    match self.anchor.plan_prepend(pre, post, pre_offset) {
                        PrependOutcome::Corrected(target) => {
                            return self.driver.apply_scroll(room, target);
                        },
                        PrependOutcome::NotSettled => {
                            tracing::debug!(room = %room, attempt, "layout not settled");
                            self.driver.next_frame().await;
                        },
                    }
                }

                tracing::warn!(room = %room, "giving up on anchor correction");
                Ok(())
            },
        }
    }

    /// Get a reference to the Thread.
    pub fn thread(&self) -> &Thread<E> {
        &self.thread
    }

    /// Get a mutable reference to the Thread.
    pub fn thread_mut(&mut self) -> &mut Thread<E> {
        &mut self.thread
    }

    /// Number of source operations currently in flight.
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}
