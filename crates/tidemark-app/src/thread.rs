//! Thread state machine.
//!
//! [`Thread`] is the heart of the engine: a pure state machine that consumes
//! [`ThreadEvent`]s and emits [`ThreadAction`]s for the runtime to execute.
//! It owns the [`MessageStore`], the [`Paginator`], the [`SendCoordinator`]
//! and the [`InsetTracker`], and composes them according to the event flow:
//!
//! ```text
//! ThreadEvent ──> handle() ──> Vec<ThreadAction>
//!                    │
//!                    └─ mutates: store, paginator, sends, inset
//! ```
//!
//! `handle` never blocks and never performs I/O. All async work (loads,
//! sends) and all layout work (measuring, scrolling, rendering) happens in
//! the runtime; completions come back in as events. This keeps every
//! behavior in this module reachable from a deterministic test.

use tidemark_core::{
    Environment, Message, MessageId, MessageStore, RoomId, SourceError, ThreadConfig, ThreadError,
};
use tracing::{debug, warn};

use crate::{
    action::{AnchorDirective, ThreadAction},
    event::ThreadEvent,
    inset::InsetTracker,
    pagination::{LoadCompletion, Paginator},
    send::SendCoordinator,
};

/// Read-only projection of one room for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView<'a> {
    /// Messages in ascending order.
    pub messages: &'a [Message],
    /// Whether a backward load is in flight (history spinner).
    pub is_loading_older: bool,
    /// Whether the room's history is exhausted (hide the spinner for good).
    pub is_exhausted: bool,
    /// Number of optimistic sends awaiting confirmation.
    pub pending_sends: usize,
}

/// Chat thread state machine.
#[derive(Debug, Clone)]
pub struct Thread<E: Environment> {
    env: E,
    config: ThreadConfig,
    store: MessageStore,
    paginator: Paginator,
    sends: SendCoordinator,
    inset: InsetTracker<E::Instant>,
    active_room: Option<RoomId>,
    last_error: Option<ThreadError>,
    status_message: Option<String>,
}

impl<E: Environment> Thread<E> {
    /// Create a thread engine with the given environment and configuration.
    pub fn new(env: E, config: ThreadConfig) -> Self {
        let inset = InsetTracker::new(&config);
        Self {
            env,
            config,
            store: MessageStore::new(),
            paginator: Paginator::new(),
            sends: SendCoordinator::new(),
            inset,
            active_room: None,
            last_error: None,
            status_message: None,
        }
    }

    /// Process one event, returning the actions the runtime must execute.
    pub fn handle(&mut self, event: ThreadEvent) -> Vec<ThreadAction> {
        match event {
            ThreadEvent::RoomOpened { room } => self.handle_room_opened(room),
            ThreadEvent::RoomClosed { room } => self.handle_room_closed(&room),
            ThreadEvent::ScrollNearTop { room } => self.begin_load(&room),
            ThreadEvent::ScrollPositionChanged { room, offset } => {
                if offset <= self.config.near_top_threshold {
                    self.begin_load(&room)
                } else {
                    Vec::new()
                }
            },
            ThreadEvent::Submit { room, text } => self.handle_submit(room, &text),
            ThreadEvent::MessageArrived { room, message } => self.handle_arrival(room, message),
            ThreadEvent::PageLoaded { room, batch, generation } => {
                self.handle_page_loaded(room, batch, generation)
            },
            ThreadEvent::LoadFailed { room, error, generation } => {
                self.handle_load_failed(room, error, generation)
            },
            ThreadEvent::SendConfirmed { room, local_id, message } => {
                self.handle_send_confirmed(room, &local_id, message)
            },
            ThreadEvent::SendFailed { room, local_id, error } => {
                self.handle_send_failed(room, &local_id, error)
            },
            ThreadEvent::ViewportResized { height } => self.handle_viewport_resized(height),
            ThreadEvent::Shutdown => vec![ThreadAction::Quit],
        }
    }

    fn handle_room_opened(&mut self, room: RoomId) -> Vec<ThreadAction> {
        debug!(room = %room, "room opened");
        self.store.open(room.clone());
        self.active_room = Some(room.clone());
        vec![
            ThreadAction::Anchor { room, directive: AnchorDirective::JumpToBottom },
            ThreadAction::Render,
        ]
    }

    fn handle_room_closed(&mut self, room: &RoomId) -> Vec<ThreadAction> {
        debug!(room = %room, "room closed");
        self.store.close(room);
        self.paginator.forget(room);
        if self.active_room.as_ref() == Some(room) {
            // Fall back to any other open room.
            self.active_room = self.store.rooms().map(|(id, _)| id.clone()).next();
        }
        if self.last_error.as_ref().is_some_and(|e| e.room() == room) {
            self.last_error = None;
            self.status_message = None;
        }
        vec![ThreadAction::Render]
    }

    /// Try to start a backward load for the room.
    ///
    /// Silently ignored when the room is unknown, already loading, or
    /// exhausted.
    fn begin_load(&mut self, room: &RoomId) -> Vec<ThreadAction> {
        if !self.store.contains(room) {
            return Vec::new();
        }

        let oldest = self.store.log(room).and_then(|log| log.oldest()).map(|m| m.id.clone());
        match self.paginator.begin(room, oldest.as_ref()) {
            Some(request) => {
                debug!(room = %room, cursor = ?request.cursor, "starting backward load");
                vec![
                    ThreadAction::LoadOlder {
                        room: room.clone(),
                        cursor: request.cursor,
                        generation: request.generation,
                    },
                    ThreadAction::Render,
                ]
            },
            None => Vec::new(),
        }
    }

    fn handle_submit(&mut self, room: RoomId, text: &str) -> Vec<ThreadAction> {
        if !self.store.contains(&room) {
            return Vec::new();
        }

        let tail_ms = self.store.log(&room).map_or(0, |log| log.tail_timestamp_ms());
        let Some(message) = self.sends.begin(text, self.env.unix_millis(), tail_ms) else {
            return Vec::new();
        };

        let local_id = message.id.clone();
        let content = message.content.clone();
        self.store.append(&room, message);
        debug!(room = %room, id = %local_id, "optimistic send appended");

        vec![
            ThreadAction::DispatchSend { room: room.clone(), local_id, content },
            ThreadAction::Anchor { room, directive: AnchorDirective::FollowIfNearBottom },
            ThreadAction::Render,
        ]
    }

    fn handle_arrival(&mut self, room: RoomId, message: Message) -> Vec<ThreadAction> {
        if !self.store.contains(&room) {
            return Vec::new();
        }
        if !self.store.append(&room, message) {
            // Duplicate id, typically an echo of a send already confirmed.
            return Vec::new();
        }
        vec![
            ThreadAction::Anchor { room, directive: AnchorDirective::FollowIfNearBottom },
            ThreadAction::Render,
        ]
    }

    fn handle_page_loaded(
        &mut self,
        room: RoomId,
        batch: Vec<Message>,
        generation: u64,
    ) -> Vec<ThreadAction> {
        let empty = batch.is_empty();
        match self.paginator.complete(&room, generation, empty) {
            LoadCompletion::Stale => {
                debug!(room = %room, "dropping stale page");
                if !self.store.contains(&room) {
                    self.paginator.forget(&room);
                }
                Vec::new()
            },
            LoadCompletion::Exhausted => {
                debug!(room = %room, "history exhausted");
                vec![ThreadAction::Render]
            },
            LoadCompletion::Accepted => {
                let inserted = self.store.prepend_batch(&room, batch);
                debug!(room = %room, inserted, "page merged");
                if inserted == 0 {
                    // Fully overlapping page; nothing moved, no correction.
                    vec![ThreadAction::Render]
                } else {
                    vec![
                        ThreadAction::Anchor {
                            room,
                            directive: AnchorDirective::PreservePosition,
                        },
                        ThreadAction::Render,
                    ]
                }
            },
        }
    }

    fn handle_load_failed(
        &mut self,
        room: RoomId,
        error: SourceError,
        generation: u64,
    ) -> Vec<ThreadAction> {
        if !self.paginator.fail(&room, generation) {
            return Vec::new();
        }
        warn!(room = %room, %error, "backward load failed");
        let error = ThreadError::LoadFailed { room, source: error };
        self.status_message = Some(error.to_string());
        self.last_error = Some(error);
        vec![ThreadAction::Render]
    }

    fn handle_send_confirmed(
        &mut self,
        room: RoomId,
        local_id: &MessageId,
        message: Message,
    ) -> Vec<ThreadAction> {
        if !self.store.replace(&room, local_id, message) {
            // Room torn down or entry already resolved.
            return Vec::new();
        }
        debug!(room = %room, id = %local_id, "send confirmed");
        vec![
            ThreadAction::Anchor { room, directive: AnchorDirective::FollowIfNearBottom },
            ThreadAction::Render,
        ]
    }

    fn handle_send_failed(
        &mut self,
        room: RoomId,
        local_id: &MessageId,
        error: SourceError,
    ) -> Vec<ThreadAction> {
        if self.store.remove(&room, local_id).is_none() {
            return Vec::new();
        }
        warn!(room = %room, id = %local_id, %error, "send failed, rolled back");
        let error = ThreadError::SendFailed { room, source: error };
        self.status_message = Some(error.to_string());
        self.last_error = Some(error);
        vec![ThreadAction::Render]
    }

    fn handle_viewport_resized(&mut self, height: f64) -> Vec<ThreadAction> {
        // The tracker emits on baseline capture and on constrained flips;
        // only a flip moves the viewport.
        let had_baseline = self.inset.current().is_some();
        let Some(inset) = self.inset.observe(height, self.env.now()) else {
            return Vec::new();
        };
        debug!(height, constrained = inset.is_constrained, "viewport inset changed");

        if !had_baseline {
            return vec![ThreadAction::Render];
        }
        match self.active_room.clone() {
            Some(room) => vec![
                ThreadAction::Anchor { room, directive: AnchorDirective::FollowIfNearBottom },
                ThreadAction::Render,
            ],
            None => vec![ThreadAction::Render],
        }
    }

    /// Convenience binding: the user submitted input text.
    pub fn submit(&mut self, room: RoomId, text: impl Into<String>) -> Vec<ThreadAction> {
        self.handle(ThreadEvent::Submit { room, text: text.into() })
    }

    /// Convenience binding: the viewport scrolled into the near-top region.
    pub fn on_scroll_near_top(&mut self, room: RoomId) -> Vec<ThreadAction> {
        self.handle(ThreadEvent::ScrollNearTop { room })
    }

    /// Convenience binding: the viewport scroll offset changed.
    pub fn on_scroll_position_changed(&mut self, room: RoomId, offset: f64) -> Vec<ThreadAction> {
        self.handle(ThreadEvent::ScrollPositionChanged { room, offset })
    }

    /// Projection of one room for rendering. `None` if the room is not open.
    pub fn view(&self, room: &RoomId) -> Option<ThreadView<'_>> {
        let log = self.store.log(room)?;
        Some(ThreadView {
            messages: log.messages(),
            is_loading_older: self.paginator.is_loading(room),
            is_exhausted: self.paginator.is_exhausted(room),
            pending_sends: log.pending_count(),
        })
    }

    /// The message store.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Engine configuration.
    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    /// Human-readable status line for the most recent failure, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Most recent error, kept until the next room teardown clears it.
    pub fn last_error(&self) -> Option<&ThreadError> {
        self.last_error.as_ref()
    }

    /// Viewport inset tracker.
    pub fn inset(&self) -> &InsetTracker<E::Instant> {
        &self.inset
    }

    /// Room most recently opened, target for viewport-level anchoring.
    pub fn active_room(&self) -> Option<&RoomId> {
        self.active_room.as_ref()
    }
}
