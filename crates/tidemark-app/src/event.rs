//! Thread input events.
//!
//! This module defines [`ThreadEvent`], the comprehensive set of inputs that
//! drive the [`crate::Thread`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (scroll, submit, viewport resize) and lifecycle.
//! - Completions of source operations the runtime dispatched earlier.

use tidemark_core::{Message, MessageId, RoomId, SourceError};

/// Events processed by the Thread state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadEvent {
    /// A conversation view opened.
    RoomOpened {
        /// Room being opened.
        room: RoomId,
    },

    /// A conversation view closed; the room is torn down.
    RoomClosed {
        /// Room being torn down.
        room: RoomId,
    },

    /// The reader scrolled into the near-top region.
    ScrollNearTop {
        /// Room whose viewport crossed the threshold.
        room: RoomId,
    },

    /// The scroll position changed.
    ///
    /// Crossing the configured near-top threshold behaves like
    /// [`ThreadEvent::ScrollNearTop`].
    ScrollPositionChanged {
        /// Room whose viewport moved.
        room: RoomId,
        /// New scroll offset in pixels from the top of the content.
        offset: f64,
    },

    /// The user submitted text.
    Submit {
        /// Target room.
        room: RoomId,
        /// Raw input text. Blank after trimming is a silent no-op.
        text: String,
    },

    /// A live inbound message arrived from the source.
    MessageArrived {
        /// Room the message belongs to.
        room: RoomId,
        /// The confirmed message.
        message: Message,
    },

    /// A backward history load completed.
    PageLoaded {
        /// Room the page belongs to.
        room: RoomId,
        /// Page in ascending order. Empty signals exhaustion.
        batch: Vec<Message>,
        /// Token echoed from the granting `LoadOlder` action. A mismatch
        /// marks the completion as stale and it is dropped.
        generation: u64,
    },

    /// A backward history load failed.
    LoadFailed {
        /// Room whose load failed.
        room: RoomId,
        /// Source error. The room returns to idle and the next trigger
        /// retries.
        error: SourceError,
        /// Token echoed from the granting `LoadOlder` action.
        generation: u64,
    },

    /// The source confirmed a dispatched send.
    SendConfirmed {
        /// Room the send belongs to.
        room: RoomId,
        /// Id of the optimistic entry to replace.
        local_id: MessageId,
        /// Server-confirmed message (possibly with a different id).
        message: Message,
    },

    /// The source rejected a dispatched send.
    SendFailed {
        /// Room the send belongs to.
        room: RoomId,
        /// Id of the optimistic entry to roll back.
        local_id: MessageId,
        /// Source error, surfaced for user-facing display.
        error: SourceError,
    },

    /// The usable viewport height changed (keyboard, device chrome).
    ViewportResized {
        /// New usable height in pixels.
        height: f64,
    },

    /// Shut the runtime down.
    Shutdown,
}
