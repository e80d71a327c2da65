//! Message and cursor types.
//!
//! A [`Message`] is either authored locally (optimistic, [`DeliveryState::Pending`]
//! until the source confirms it) or received from the source as confirmed
//! history. Delivery is a tagged variant rather than separate boolean flags so
//! the rollback path is a single pattern-matched transition.

use serde::{Deserialize, Serialize};

/// Unique message identifier within a room.
///
/// Confirmed messages carry the source-assigned id. Optimistic entries use a
/// locally-synthesized id (`local-<n>`) that is unique within the room and
/// monotonic in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create a message id from a source-assigned token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesize a local id for an optimistic entry.
    pub fn local(seq: u64) -> Self {
        Self(format!("local-{seq}"))
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Who authored a message relative to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Authored on this device.
    Local,
    /// Received from a peer via the source.
    Remote,
}

/// Delivery lifecycle of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    /// Optimistically appended, awaiting source confirmation.
    Pending,
    /// Confirmed by the source (all loaded history is confirmed).
    Confirmed,
    /// The source rejected the send.
    Failed,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id within the room.
    pub id: MessageId,
    /// Message text.
    pub content: String,
    /// Creation timestamp, unix milliseconds.
    pub created_at_ms: i64,
    /// Local or remote authorship.
    pub direction: Direction,
    /// Delivery lifecycle state.
    pub delivery: DeliveryState,
    /// Peer read receipt. `None` if the source does not report it.
    pub read: Option<bool>,
}

impl Message {
    /// Create a confirmed remote message (loaded history or live inbound).
    pub fn remote(id: MessageId, content: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            id,
            content: content.into(),
            created_at_ms,
            direction: Direction::Remote,
            delivery: DeliveryState::Confirmed,
            read: None,
        }
    }

    /// Create an optimistic local message awaiting confirmation.
    pub fn pending(id: MessageId, content: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            id,
            content: content.into(),
            created_at_ms,
            direction: Direction::Local,
            delivery: DeliveryState::Pending,
            read: None,
        }
    }

    /// Whether this message is still awaiting confirmation.
    pub fn is_pending(&self) -> bool {
        self.delivery == DeliveryState::Pending
    }
}

/// Opaque pagination token identifying the oldest message currently known.
///
/// `None` at pagination start means "start from newest". The engine derives
/// the next cursor from the id of the current oldest message at the moment a
/// load is triggered, never from a value captured earlier, so a page that
/// overlaps a just-merged prior load is not requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Cursor token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&MessageId> for Cursor {
    fn from(id: &MessageId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
