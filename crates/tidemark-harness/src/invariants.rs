//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must hold after every step of system
//! execution, whatever the interleaving. The harness extracts observable
//! state into a [`ThreadSnapshot`], then runs registered [`Invariant`]
//! checks against it. Violations carry enough context to reconstruct the
//! failing room.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = ThreadSnapshot::capture(&thread);
//! registry.assert_all(&snapshot, "after page merge");
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tidemark_app::Thread;
use tidemark_core::Environment;

/// Observable state of one room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    /// Message ids in log order.
    pub message_ids: Vec<String>,
    /// Timestamps in log order.
    pub timestamps: Vec<i64>,
    /// Per-message pending flags in log order.
    pub pending: Vec<bool>,
    /// Pending count as reported by the log.
    pub pending_count: usize,
    /// Whether a backward load is in flight.
    pub is_loading: bool,
    /// Whether history is exhausted.
    pub is_exhausted: bool,
}

/// Observable state of the whole thread engine.
///
/// Rooms are keyed by id in a sorted map so serialized snapshots are
/// stable.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSnapshot {
    /// Open rooms by id.
    pub rooms: BTreeMap<String, RoomSnapshot>,
}

impl ThreadSnapshot {
    /// Capture the observable state of a thread.
    pub fn capture<E: Environment>(thread: &Thread<E>) -> Self {
        let mut rooms = BTreeMap::new();
        for (room_id, _) in thread.store().rooms() {
            let Some(view) = thread.view(room_id) else { continue };
            rooms.insert(
                room_id.as_str().to_string(),
                RoomSnapshot {
                    message_ids: view.messages.iter().map(|m| m.id.as_str().to_string()).collect(),
                    timestamps: view.messages.iter().map(|m| m.created_at_ms).collect(),
                    pending: view.messages.iter().map(tidemark_core::Message::is_pending).collect(),
                    pending_count: view.pending_sends,
                    is_loading: view.is_loading_older,
                    is_exhausted: view.is_exhausted,
                },
            );
        }
        Self { rooms }
    }

    /// Empty snapshot, for baseline assertions.
    pub fn empty() -> Self {
        Self { rooms: BTreeMap::new() }
    }
}

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against thread state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    fn check(&self, state: &ThreadSnapshot) -> InvariantResult;
}

/// Timestamps never decrease within a room's log.
pub struct AscendingTimestamps;

impl Invariant for AscendingTimestamps {
    fn name(&self) -> &'static str {
        "AscendingTimestamps"
    }

    fn check(&self, state: &ThreadSnapshot) -> InvariantResult {
        for (room, snapshot) in &state.rooms {
            if let Some(pair) = snapshot.timestamps.windows(2).find(|w| w[0] > w[1]) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {room}: {} before {}", pair[0], pair[1]),
                });
            }
        }
        Ok(())
    }
}

/// No message id appears twice within a room's log.
pub struct UniqueMessageIds;

impl Invariant for UniqueMessageIds {
    fn name(&self) -> &'static str {
        "UniqueMessageIds"
    }

    fn check(&self, state: &ThreadSnapshot) -> InvariantResult {
        for (room, snapshot) in &state.rooms {
            let mut seen = HashSet::new();
            for id in &snapshot.message_ids {
                if !seen.insert(id) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("room {room}: duplicate id {id}"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The reported pending count matches the per-message pending flags.
pub struct PendingCountConsistency;

impl Invariant for PendingCountConsistency {
    fn name(&self) -> &'static str {
        "PendingCountConsistency"
    }

    fn check(&self, state: &ThreadSnapshot) -> InvariantResult {
        for (room, snapshot) in &state.rooms {
            let actual = snapshot.pending.iter().filter(|p| **p).count();
            if actual != snapshot.pending_count {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {room}: reported {} pending, log has {actual}",
                        snapshot.pending_count
                    ),
                });
            }
        }
        Ok(())
    }
}

/// An exhausted room never has a load in flight.
pub struct ExhaustedNotLoading;

impl Invariant for ExhaustedNotLoading {
    fn name(&self) -> &'static str {
        "ExhaustedNotLoading"
    }

    fn check(&self, state: &ThreadSnapshot) -> InvariantResult {
        for (room, snapshot) in &state.rooms {
            if snapshot.is_exhausted && snapshot.is_loading {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {room}: loading while exhausted"),
                });
            }
        }
        Ok(())
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard thread invariants.
    ///
    /// Includes:
    /// - [`AscendingTimestamps`]: log order never goes backwards
    /// - [`UniqueMessageIds`]: no duplicate entries
    /// - [`PendingCountConsistency`]: pending counter matches the log
    /// - [`ExhaustedNotLoading`]: exhaustion is terminal
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(AscendingTimestamps);
        registry.add(UniqueMessageIds);
        registry.add(PendingCountConsistency);
        registry.add(ExhaustedNotLoading);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &ThreadSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    pub fn assert_all(&self, state: &ThreadSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(|v| v.to_string()).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
