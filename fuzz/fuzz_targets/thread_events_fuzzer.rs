//! Fuzz target for the thread state machine.
//!
//! Feeds arbitrary event sequences, including completions for rooms that
//! were never opened, duplicate confirmations, and hostile input text, and
//! asserts structural invariants after every step.
//!
//! # Invariants
//!
//! - The state machine never panics on any event sequence
//! - No message id appears twice within a room
//! - Pending counters match the per-message delivery states
//! - An exhausted room never grants another load

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tidemark_app::{SystemEnv, Thread, ThreadAction, ThreadEvent};
use tidemark_core::{Message, MessageId, RoomId, SourceError, ThreadConfig};

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Open { room: u8 },
    Close { room: u8 },
    NearTop { room: u8 },
    ScrollTo { room: u8, offset: u16 },
    Submit { room: u8, text: String },
    Arrive { room: u8, id: u8, at: i16 },
    PageLoaded { room: u8, batch: Vec<(u8, i16)>, generation: u8 },
    LoadFailed { room: u8, generation: u8 },
    SendConfirmed { room: u8, local_seq: u8, id: u8, at: i16 },
    SendFailed { room: u8, local_seq: u8 },
    Resize { height: u16 },
}

fn room(index: u8) -> RoomId {
    RoomId::new(format!("r{}", index % 4))
}

fn remote(id: u8, at: i16) -> Message {
    Message::remote(MessageId::new(format!("m{id}")), "x", i64::from(at))
}

impl FuzzEvent {
    fn concretize(self) -> ThreadEvent {
        match self {
            Self::Open { room: r } => ThreadEvent::RoomOpened { room: room(r) },
            Self::Close { room: r } => ThreadEvent::RoomClosed { room: room(r) },
            Self::NearTop { room: r } => ThreadEvent::ScrollNearTop { room: room(r) },
            Self::ScrollTo { room: r, offset } => ThreadEvent::ScrollPositionChanged {
                room: room(r),
                offset: f64::from(offset),
            },
            Self::Submit { room: r, text } => ThreadEvent::Submit { room: room(r), text },
            Self::Arrive { room: r, id, at } => {
                ThreadEvent::MessageArrived { room: room(r), message: remote(id, at) }
            },
            Self::PageLoaded { room: r, batch, generation } => ThreadEvent::PageLoaded {
                room: room(r),
                batch: batch.into_iter().map(|(id, at)| remote(id, at)).collect(),
                generation: u64::from(generation),
            },
            Self::LoadFailed { room: r, generation } => ThreadEvent::LoadFailed {
                room: room(r),
                error: SourceError::Unavailable("fuzz".to_string()),
                generation: u64::from(generation),
            },
            Self::SendConfirmed { room: r, local_seq, id, at } => ThreadEvent::SendConfirmed {
                room: room(r),
                local_id: MessageId::local(u64::from(local_seq)),
                message: remote(id, at),
            },
            Self::SendFailed { room: r, local_seq } => ThreadEvent::SendFailed {
                room: room(r),
                local_id: MessageId::local(u64::from(local_seq)),
                error: SourceError::Rejected("fuzz".to_string()),
            },
            Self::Resize { height } => {
                ThreadEvent::ViewportResized { height: f64::from(height) }
            },
        }
    }
}

fn check(thread: &Thread<SystemEnv>) {
    for (room_id, log) in thread.store().rooms() {
        let mut seen = std::collections::HashSet::new();
        for m in log.messages() {
            assert!(seen.insert(m.id.clone()), "duplicate id {} in {room_id}", m.id);
        }
        let pending = log.messages().iter().filter(|m| m.is_pending()).count();
        assert_eq!(pending, log.pending_count());
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut thread = Thread::new(SystemEnv::new(), ThreadConfig::default());

    for event in events {
        let event = event.concretize();
        let exhausted = match &event {
            ThreadEvent::ScrollNearTop { room } => {
                thread.view(room).is_some_and(|v| v.is_exhausted)
            },
            _ => false,
        };

        let actions = thread.handle(event);
        if exhausted {
            assert!(
                !actions.iter().any(|a| matches!(a, ThreadAction::LoadOlder { .. })),
                "load granted on exhausted room"
            );
        }
        check(&thread);
    }
});
