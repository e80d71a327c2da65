//! Per-room ordered message log and the owning store.
//!
//! [`RoomLog`] keeps one room's messages in ascending `created_at_ms`/arrival
//! order. Confirmed history is never reordered: older pages are prepended,
//! new tail entries appended, and optimistic entries replaced in place.
//! Duplicate ids are rejected as idempotent no-ops so overlapping pages and
//! live echoes of in-flight sends stay safe.
//!
//! All operations are synchronous and total. The store has no knowledge of
//! network state; pagination and delivery live in the application layer.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageId};

/// Room identifier. Opaque, source-defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from a source-defined token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Ordered message log for a single room.
#[derive(Debug, Clone, Default)]
pub struct RoomLog {
    /// Messages in ascending order.
    messages: Vec<Message>,
    /// Ids present in `messages`, for O(1) duplicate rejection.
    ids: HashSet<MessageId>,
    /// Number of entries currently in `DeliveryState::Pending`.
    pending: usize,
}

impl RoomLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the tail.
    ///
    /// Returns `false` without side effect if the id is already present.
    pub fn append(&mut self, message: Message) -> bool {
        if self.ids.contains(&message.id) {
            return false;
        }
        self.ids.insert(message.id.clone());
        if message.is_pending() {
            self.pending += 1;
        }
        self.messages.push(message);
        true
    }

    /// Prepend a batch of older messages strictly before the current oldest.
    ///
    /// The batch's relative order is preserved. Ids already present are
    /// skipped, which tolerates overlapping pages. Returns the number of
    /// messages actually inserted.
    pub fn prepend_batch(&mut self, batch: Vec<Message>) -> usize {
        let mut fresh: Vec<Message> = Vec::with_capacity(batch.len());
        for message in batch {
            if self.ids.contains(&message.id) {
                continue;
            }
            self.ids.insert(message.id.clone());
            if message.is_pending() {
                self.pending += 1;
            }
            fresh.push(message);
        }

        let inserted = fresh.len();
        if inserted > 0 {
            fresh.append(&mut self.messages);
            self.messages = fresh;
        }

        debug_assert_eq!(self.messages.len(), self.ids.len());
        inserted
    }

    /// Replace the entry with `local_id` by a confirmed message, in place.
    ///
    /// The replacement keeps the entry's position; the log is never
    /// re-sorted. If the confirmed id already exists elsewhere in the log
    /// (a live echo raced the confirmation), the optimistic entry is removed
    /// instead. Returns `false` if `local_id` is not present.
    pub fn replace(&mut self, local_id: &MessageId, confirmed: Message) -> bool {
        let Some(index) = self.messages.iter().position(|m| &m.id == local_id) else {
            return false;
        };

        if confirmed.id != *local_id && self.ids.contains(&confirmed.id) {
            // The confirmed copy already arrived through another path.
            self.remove(local_id);
            return true;
        }

        if self.messages[index].is_pending() {
            self.pending -= 1;
        }
        if confirmed.is_pending() {
            self.pending += 1;
        }

        self.ids.remove(local_id);
        self.ids.insert(confirmed.id.clone());
        self.messages[index] = confirmed;
        true
    }

    /// Remove the entry with the given id. Returns it if present.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| &m.id == id)?;
        self.ids.remove(id);
        let message = self.messages.remove(index);
        if message.is_pending() {
            self.pending -= 1;
        }
        Some(message)
    }

    /// Messages in ascending order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Oldest message currently known. `None` if the log is empty.
    pub fn oldest(&self) -> Option<&Message> {
        self.messages.first()
    }

    /// Newest message currently known. `None` if the log is empty.
    pub fn newest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of in-flight optimistic sends.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Timestamp of the newest entry, or 0 for an empty log.
    ///
    /// Used to clamp optimistic timestamps so a skewed wall clock cannot
    /// violate the ascending-order invariant.
    pub fn tail_timestamp_ms(&self) -> i64 {
        self.newest().map_or(0, |m| m.created_at_ms)
    }
}

/// Owned map of room logs.
///
/// Rooms are created on first access and torn down when the conversation
/// view closes. Teardown is idempotent against pending continuations: an
/// operation against an absent room is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    rooms: HashMap<RoomId, RoomLog>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a room exists, creating an empty log on first access.
    pub fn open(&mut self, room: RoomId) -> &mut RoomLog {
        self.rooms.entry(room).or_default()
    }

    /// Tear a room down, discarding its log. Idempotent.
    pub fn close(&mut self, room: &RoomId) {
        self.rooms.remove(room);
    }

    /// Log for a room. `None` if the room has not been opened.
    pub fn log(&self, room: &RoomId) -> Option<&RoomLog> {
        self.rooms.get(room)
    }

    /// Mutable log for a room, created on first access.
    pub fn log_mut(&mut self, room: &RoomId) -> &mut RoomLog {
        self.rooms.entry(room.clone()).or_default()
    }

    /// Whether the room currently exists in the store.
    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Append a message to a room, creating the room on first access.
    pub fn append(&mut self, room: &RoomId, message: Message) -> bool {
        self.log_mut(room).append(message)
    }

    /// Prepend a batch of older messages to a room.
    ///
    /// No-op returning 0 if the room has been torn down.
    pub fn prepend_batch(&mut self, room: &RoomId, batch: Vec<Message>) -> usize {
        match self.rooms.get_mut(room) {
            Some(log) => log.prepend_batch(batch),
            None => 0,
        }
    }

    /// Replace an optimistic entry with its confirmed form.
    ///
    /// No-op returning `false` if the room has been torn down.
    pub fn replace(&mut self, room: &RoomId, local_id: &MessageId, confirmed: Message) -> bool {
        match self.rooms.get_mut(room) {
            Some(log) => log.replace(local_id, confirmed),
            None => false,
        }
    }

    /// Remove a message from a room.
    pub fn remove(&mut self, room: &RoomId, id: &MessageId) -> Option<Message> {
        self.rooms.get_mut(room)?.remove(id)
    }

    /// Number of open rooms. Useful for debugging and testing.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Iterate over open rooms and their logs.
    pub fn rooms(&self) -> impl Iterator<Item = (&RoomId, &RoomLog)> {
        self.rooms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn remote(id: &str, at: i64) -> Message {
        Message::remote(MessageId::from(id), format!("msg {id}"), at)
    }

    #[test]
    fn append_rejects_duplicate_ids() {
        let mut log = RoomLog::new();
        assert!(log.append(remote("m1", 10)));
        assert!(!log.append(remote("m1", 11)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].created_at_ms, 10);
    }

    #[test]
    fn prepend_preserves_batch_order_before_existing() {
        let mut log = RoomLog::new();
        log.append(remote("m5", 50));
        log.append(remote("m6", 60));
        log.append(remote("m7", 70));

        let inserted =
            log.prepend_batch(vec![remote("m2", 20), remote("m3", 30), remote("m4", 40)]);
        assert_eq!(inserted, 3);

        let ids: Vec<&str> = log.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m2", "m3", "m4", "m5", "m6", "m7"]);
    }

    #[test]
    fn overlapping_prepend_is_idempotent() {
        let mut log = RoomLog::new();
        log.append(remote("m3", 30));
        log.append(remote("m4", 40));

        // Page overlaps m3: only m2 is new.
        let inserted = log.prepend_batch(vec![remote("m2", 20), remote("m3", 99)]);
        assert_eq!(inserted, 1);

        let ids: Vec<&str> = log.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m2", "m3", "m4"]);
        // Existing entry untouched, not reordered or rewritten.
        assert_eq!(log.messages()[1].created_at_ms, 30);
    }

    #[test]
    fn replace_substitutes_in_place() {
        let mut log = RoomLog::new();
        log.append(remote("m1", 10));
        log.append(Message::pending(MessageId::local(1), "hello", 20));
        log.append(remote("m2", 30));
        assert_eq!(log.pending_count(), 1);

        let confirmed = Message::remote(MessageId::from("srv-9"), "hello", 21);
        assert!(log.replace(&MessageId::local(1), confirmed));

        let ids: Vec<&str> = log.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "srv-9", "m2"]);
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn replace_drops_optimistic_when_echo_already_present() {
        let mut log = RoomLog::new();
        log.append(Message::pending(MessageId::local(1), "hello", 10));
        // Live channel delivered the confirmed copy first.
        log.append(remote("srv-1", 11));

        let confirmed = Message::remote(MessageId::from("srv-1"), "hello", 11);
        assert!(log.replace(&MessageId::local(1), confirmed));

        let ids: Vec<&str> = log.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["srv-1"]);
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn remove_rolls_back_pending() {
        let mut log = RoomLog::new();
        log.append(Message::pending(MessageId::local(1), "hello", 10));
        assert_eq!(log.pending_count(), 1);

        let removed = log.remove(&MessageId::local(1));
        assert_eq!(removed.map(|m| m.content), Some("hello".to_string()));
        assert!(log.is_empty());
        assert_eq!(log.pending_count(), 0);

        // Second removal is a no-op.
        assert!(log.remove(&MessageId::local(1)).is_none());
    }

    #[test]
    fn store_creates_room_on_first_access() {
        let mut store = MessageStore::new();
        let room = RoomId::from("dm:42");
        assert!(!store.contains(&room));

        store.append(&room, remote("m1", 10));
        assert!(store.contains(&room));
        assert_eq!(store.log(&room).map(RoomLog::len), Some(1));
    }

    #[test]
    fn close_is_idempotent_and_drops_continuations() {
        let mut store = MessageStore::new();
        let room = RoomId::from("dm:42");
        store.open(room.clone());
        store.close(&room);
        store.close(&room);

        // A continuation completing after teardown has no observable effect.
        assert_eq!(store.prepend_batch(&room, vec![remote("m1", 10)]), 0);
        assert!(!store.replace(&room, &MessageId::local(1), remote("m2", 20)));
        assert!(!store.contains(&room));
    }

    #[test]
    fn tail_timestamp_tracks_newest() {
        let mut log = RoomLog::new();
        assert_eq!(log.tail_timestamp_ms(), 0);
        log.append(remote("m1", 10));
        log.append(remote("m2", 25));
        assert_eq!(log.tail_timestamp_ms(), 25);
    }
}
