//! Optimistic send coordination.
//!
//! Synthesizes the locally-visible message for a submit before the source
//! has confirmed anything. The entry carries a `local-<n>` id unique within
//! the thread and starts in `DeliveryState::Pending`; confirmation replaces
//! it in place and failure removes it again (both handled by the store).
//!
//! Unlike pagination there is no single-flight constraint: concurrent sends
//! in the same room are independent and do not block one another.

use tidemark_core::{Message, MessageId};

/// Synthesizer for optimistic messages.
#[derive(Debug, Clone, Default)]
pub struct SendCoordinator {
    next_seq: u64,
}

impl SendCoordinator {
    /// Create a coordinator with a fresh id sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize the optimistic entry for a submit.
    ///
    /// Returns `None` for content that is blank after trimming — nothing to
    /// send, no error, no side effect. The timestamp is clamped to
    /// `tail_ms`, the newest entry's timestamp, so a skewed wall clock
    /// cannot place the entry before existing history.
    pub fn begin(&mut self, content: &str, now_ms: i64, tail_ms: i64) -> Option<Message> {
        let text = content.trim();
        if text.is_empty() {
            return None;
        }

        self.next_seq += 1;
        let created_at_ms = now_ms.max(tail_ms);
        Some(Message::pending(MessageId::local(self.next_seq), text, created_at_ms))
    }
}
