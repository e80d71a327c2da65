//! Backward pagination state machine.
//!
//! One [`PageState`] per room, keyed by room id. At most one backward load
//! is ever in flight per room; while `Loading`, further near-top triggers
//! are ignored. Exhaustion is terminal.
//!
//! # State Machine
//!
//! ```text
//!             near-top trigger              empty page
//! ┌──────┐ ──────────────────> ┌─────────┐ ───────────> ┌───────────┐
//! │ Idle │                     │ Loading │              │ Exhausted │
//! └──────┘ <────────────────── └─────────┘              └───────────┘
//!             page merged / load failed
//! ```
//!
//! The cursor for a load is derived from the room's current oldest message
//! at the moment the trigger fires, never from a value captured earlier, so
//! a page overlapping a just-merged prior load is not requested.
//!
//! Every granted load carries a generation token that the completion must
//! echo back. The token is minted from a counter that never resets, so a
//! completion dispatched before a room was torn down can never be mistaken
//! for the load of a reopened room.

use std::collections::HashMap;

use tidemark_core::{Cursor, MessageId, RoomId};

/// Per-room backward load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// No load in flight; a near-top trigger may start one.
    #[default]
    Idle,
    /// A load is in flight; further triggers are ignored.
    Loading,
    /// The source returned an empty page; no further loads, ever.
    Exhausted,
}

/// A granted load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Cursor for the next older page. `None` starts from newest.
    pub cursor: Option<Cursor>,
    /// Generation token the completion must echo back.
    pub generation: u64,
}

/// Outcome of reporting a load completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCompletion {
    /// The page was accepted; the room returned to idle.
    Accepted,
    /// The page was empty; the room is exhausted.
    Exhausted,
    /// The room was not loading (torn down or duplicate completion); drop.
    Stale,
}

/// Per-room paging record.
#[derive(Debug, Clone, Copy, Default)]
struct RoomPaging {
    state: PageState,
    /// Generation of the in-flight load; meaningful only while `Loading`.
    generation: u64,
}

/// Backward pagination controller for all rooms.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    rooms: HashMap<RoomId, RoomPaging>,
    next_generation: u64,
}

impl Paginator {
    /// Create a paginator with no rooms tracked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a room. Untracked rooms are idle.
    pub fn state(&self, room: &RoomId) -> PageState {
        self.rooms.get(room).map(|r| r.state).unwrap_or_default()
    }

    /// Whether a load is in flight for the room.
    pub fn is_loading(&self, room: &RoomId) -> bool {
        self.state(room) == PageState::Loading
    }

    /// Whether the room's history is exhausted.
    pub fn is_exhausted(&self, room: &RoomId) -> bool {
        self.state(room) == PageState::Exhausted
    }

    /// Try to start a load for the room.
    ///
    /// Grants a [`LoadRequest`] only from `Idle`; returns `None` while
    /// `Loading` (single-flight) or once `Exhausted` (terminal). The cursor
    /// is derived from `oldest`, the id of the room's current oldest
    /// message.
    pub fn begin(&mut self, room: &RoomId, oldest: Option<&MessageId>) -> Option<LoadRequest> {
        match self.state(room) {
            PageState::Idle => {
                self.next_generation += 1;
                let generation = self.next_generation;
                self.rooms
                    .insert(room.clone(), RoomPaging { state: PageState::Loading, generation });
                Some(LoadRequest { cursor: oldest.map(Cursor::from), generation })
            },
            PageState::Loading | PageState::Exhausted => None,
        }
    }

    /// Report a load completion.
    ///
    /// `generation` must echo the token the granting [`LoadRequest`]
    /// carried; `empty` marks the page as the exhaustion signal. Completions
    /// for rooms that are not `Loading`, or that carry the token of an
    /// earlier load, are reported as [`LoadCompletion::Stale`] and must be
    /// dropped by the caller.
    pub fn complete(&mut self, room: &RoomId, generation: u64, empty: bool) -> LoadCompletion {
        if !self.is_current(room, generation) {
            return LoadCompletion::Stale;
        }

        if empty {
            self.rooms
                .insert(room.clone(), RoomPaging { state: PageState::Exhausted, generation: 0 });
            LoadCompletion::Exhausted
        } else {
            self.rooms.insert(room.clone(), RoomPaging::default());
            LoadCompletion::Accepted
        }
    }

    /// Report a load failure. Returns to `Idle` (retryable on the next
    /// trigger); `false` if the room was not loading or the token belongs
    /// to an earlier load.
    pub fn fail(&mut self, room: &RoomId, generation: u64) -> bool {
        if !self.is_current(room, generation) {
            return false;
        }
        self.rooms.insert(room.clone(), RoomPaging::default());
        true
    }

    fn is_current(&self, room: &RoomId, generation: u64) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|r| r.state == PageState::Loading && r.generation == generation)
    }

    /// Drop all state for a torn-down room.
    pub fn forget(&mut self, room: &RoomId) {
        self.rooms.remove(room);
    }
}
