//! Scripted message source.
//!
//! `ScriptedSource` implements `MessageSource` with per-room queues of
//! canned replies and a hold gate, so tests control both what the source
//! answers and when it answers. Clones share state; the test keeps a handle
//! while the runtime owns another.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use tidemark_app::MessageSource;
use tidemark_core::{Cursor, Message, MessageId, RoomId, SourceError};
use tokio::sync::Notify;

/// A recorded call against the source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    /// A history load with the cursor the engine derived.
    LoadOlder {
        /// Room loaded.
        room: RoomId,
        /// Cursor passed by the engine.
        cursor: Option<Cursor>,
    },
    /// A send dispatch with the trimmed content.
    Send {
        /// Target room.
        room: RoomId,
        /// Dispatched content.
        content: String,
    },
}

#[derive(Default)]
struct Script {
    pages: HashMap<RoomId, VecDeque<Result<Vec<Message>, SourceError>>>,
    send_replies: HashMap<RoomId, VecDeque<Result<Message, SourceError>>>,
    calls: Vec<SourceCall>,
    next_auto: u64,
    held: bool,
}

/// Message source with scripted replies.
///
/// Unqueued loads resolve to an empty page (exhaustion); unqueued sends
/// confirm with a generated `srv-<n>` id echoing the content.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
    gate: Arc<Notify>,
}

impl ScriptedSource {
    /// Create a source with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page for the room's next load.
    pub fn queue_page(&self, room: &RoomId, page: Vec<Message>) {
        self.script.lock().unwrap().pages.entry(room.clone()).or_default().push_back(Ok(page));
    }

    /// Queue a failure for the room's next load.
    pub fn queue_load_error(&self, room: &RoomId, error: SourceError) {
        self.script.lock().unwrap().pages.entry(room.clone()).or_default().push_back(Err(error));
    }

    /// Queue a confirmation for the room's next send.
    pub fn queue_send_reply(&self, room: &RoomId, confirmed: Message) {
        self.script
            .lock()
            .unwrap()
            .send_replies
            .entry(room.clone())
            .or_default()
            .push_back(Ok(confirmed));
    }

    /// Queue a failure for the room's next send.
    pub fn queue_send_error(&self, room: &RoomId, error: SourceError) {
        self.script
            .lock()
            .unwrap()
            .send_replies
            .entry(room.clone())
            .or_default()
            .push_back(Err(error));
    }

    /// Hold all operations until [`ScriptedSource::release`].
    pub fn hold(&self) {
        self.script.lock().unwrap().held = true;
    }

    /// Release held operations.
    pub fn release(&self) {
        self.script.lock().unwrap().held = false;
        self.gate.notify_waiters();
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Number of loads dispatched so far.
    pub fn load_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, SourceCall::LoadOlder { .. })).count()
    }

    async fn wait_if_held(&self) {
        loop {
            let released = self.gate.notified();
            if !self.script.lock().unwrap().held {
                return;
            }
            released.await;
        }
    }
}

impl MessageSource for ScriptedSource {
    async fn load_older(
        &self,
        room: RoomId,
        cursor: Option<Cursor>,
    ) -> Result<Vec<Message>, SourceError> {
        {
            let mut script = self.script.lock().unwrap();
            script.calls.push(SourceCall::LoadOlder { room: room.clone(), cursor });
        }
        self.wait_if_held().await;

        let mut script = self.script.lock().unwrap();
        match script.pages.get_mut(&room).and_then(VecDeque::pop_front) {
            Some(reply) => reply,
            None => Ok(Vec::new()),
        }
    }

    async fn send(&self, room: RoomId, content: String) -> Result<Message, SourceError> {
        {
            let mut script = self.script.lock().unwrap();
            script.calls.push(SourceCall::Send { room: room.clone(), content: content.clone() });
        }
        self.wait_if_held().await;

        let mut script = self.script.lock().unwrap();
        match script.send_replies.get_mut(&room).and_then(VecDeque::pop_front) {
            Some(reply) => reply,
            None => {
                script.next_auto += 1;
                let id = MessageId::new(format!("srv-{}", script.next_auto));
                let at = i64::try_from(script.next_auto).unwrap_or(i64::MAX);
                Ok(Message::remote(id, content, at))
            },
        }
    }
}
