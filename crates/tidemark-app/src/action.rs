//! Thread side-effects and intents.
//!
//! This module defines the [`ThreadAction`] enum, which represents
//! instructions produced by the [`crate::Thread`] state machine for the
//! runtime to execute.

use tidemark_core::{Cursor, MessageId, RoomId};

/// Scroll policy the runtime applies around the next render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorDirective {
    /// Scroll to the newest message unconditionally (initial mount).
    JumpToBottom,

    /// Scroll to the newest message only if the reader was near the bottom
    /// before the mutation (tail append).
    FollowIfNearBottom,

    /// Shift the offset by the prepended content height so the previously
    /// visible message stays visually fixed (history merge).
    PreservePosition,
}

/// Actions produced by the Thread state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadAction {
    /// Request a page of history older than the cursor from the source.
    LoadOlder {
        /// Room to load history for.
        room: RoomId,
        /// Cursor derived from the current oldest message. `None` starts
        /// from newest.
        cursor: Option<Cursor>,
        /// Token the completion event must echo back; completions carrying
        /// an earlier token are dropped as stale.
        generation: u64,
    },

    /// Dispatch an optimistic send to the source.
    DispatchSend {
        /// Target room.
        room: RoomId,
        /// Id of the optimistic entry awaiting confirmation.
        local_id: MessageId,
        /// Trimmed message text.
        content: String,
    },

    /// Apply a scroll policy around the next render.
    Anchor {
        /// Room whose viewport is anchored.
        room: RoomId,
        /// Policy to apply.
        directive: AnchorDirective,
    },

    /// Render the thread state.
    Render,

    /// Quit the runtime loop.
    Quit,
}
