//! Fuzz target for the message store.
//!
//! Drives a `RoomLog` through arbitrary interleavings of appends, prepends,
//! replaces, and removals drawn from a small id space so duplicate and
//! overlap paths are hit constantly.
//!
//! # Invariants
//!
//! - No message id ever appears twice in the log
//! - The pending counter always matches the per-message delivery states
//! - An operation reported as rejected leaves the log unchanged
//! - Prepended batches land strictly before pre-existing entries

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tidemark_core::{Message, MessageId, RoomLog};

#[derive(Debug, Clone, Arbitrary)]
enum StoreOp {
    Append { id: u8, at: i16, pending: bool },
    PrependBatch { batch: Vec<(u8, i16)> },
    Replace { local: u8, confirmed: u8, at: i16 },
    Remove { id: u8 },
}

fn message(id: u8, at: i16, pending: bool) -> Message {
    let id = MessageId::new(format!("m{id}"));
    if pending {
        Message::pending(id, "x", i64::from(at))
    } else {
        Message::remote(id, "x", i64::from(at))
    }
}

fn check(log: &RoomLog) {
    let mut seen = std::collections::HashSet::new();
    for m in log.messages() {
        assert!(seen.insert(m.id.clone()), "duplicate id {}", m.id);
    }
    let pending = log.messages().iter().filter(|m| m.is_pending()).count();
    assert_eq!(pending, log.pending_count());
    assert_eq!(log.len(), log.messages().len());
}

fuzz_target!(|ops: Vec<StoreOp>| {
    let mut log = RoomLog::new();

    for op in ops {
        match op {
            StoreOp::Append { id, at, pending } => {
                let before = log.len();
                let inserted = log.append(message(id, at, pending));
                assert_eq!(log.len(), before + usize::from(inserted));
            },
            StoreOp::PrependBatch { batch } => {
                let tail_before: Vec<MessageId> =
                    log.messages().iter().map(|m| m.id.clone()).collect();
                let inserted = log
                    .prepend_batch(batch.iter().map(|(id, at)| message(*id, *at, false)).collect());
                // Existing entries keep their relative order behind the batch.
                let tail_after: Vec<MessageId> =
                    log.messages().iter().skip(inserted).map(|m| m.id.clone()).collect();
                assert_eq!(tail_before, tail_after);
            },
            StoreOp::Replace { local, confirmed, at } => {
                let local = MessageId::new(format!("m{local}"));
                let had_local = log.messages().iter().any(|m| m.id == local);
                let replaced = log.replace(&local, message(confirmed, at, false));
                assert_eq!(replaced, had_local);
            },
            StoreOp::Remove { id } => {
                let id = MessageId::new(format!("m{id}"));
                let had = log.messages().iter().any(|m| m.id == id);
                assert_eq!(log.remove(&id).is_some(), had);
            },
        }
        check(&log);
    }
});
