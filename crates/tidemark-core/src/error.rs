//! Error types for the thread engine.
//!
//! Strongly-typed errors for the two fallible seams: loading older history
//! and dispatching a send. Blank input to submit is not an error — it is a
//! silent no-op. No error here is fatal to the process; every failure is
//! locally recoverable (a failed load returns the room to idle, a failed
//! send rolls the optimistic entry back).

use thiserror::Error;

use crate::store::RoomId;

/// Errors returned by a message source's load and send operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The backend could not be reached or answered with a transient fault.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The backend understood the request and refused it.
    #[error("source rejected request: {0}")]
    Rejected(String),
}

impl SourceError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// The engine itself never retries; this classification is for the
    /// caller's retry policy, if it layers one on.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors surfaced by the thread engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// A backward history load failed. The room returned to idle and the
    /// next near-top trigger retries.
    #[error("history load failed for room {room}: {source}")]
    LoadFailed {
        /// Room whose load failed.
        room: RoomId,
        /// Underlying source error.
        source: SourceError,
    },

    /// A send failed. The optimistic entry was rolled back; the error is
    /// surfaced for user-facing display.
    #[error("send failed for room {room}: {source}")]
    SendFailed {
        /// Room whose send failed.
        room: RoomId,
        /// Underlying source error.
        source: SourceError,
    },
}

impl ThreadError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            // A load is always retryable by the same threshold trigger.
            Self::LoadFailed { .. } => true,
            Self::SendFailed { source, .. } => source.is_transient(),
        }
    }

    /// Room the error concerns.
    pub fn room(&self) -> &RoomId {
        match self {
            Self::LoadFailed { room, .. } | Self::SendFailed { room, .. } => room,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failures_are_always_transient() {
        let err = ThreadError::LoadFailed {
            room: RoomId::from("r1"),
            source: SourceError::Rejected("bad cursor".to_string()),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn send_failure_transience_follows_source() {
        let unavailable = ThreadError::SendFailed {
            room: RoomId::from("r1"),
            source: SourceError::Unavailable("offline".to_string()),
        };
        assert!(unavailable.is_transient());

        let rejected = ThreadError::SendFailed {
            room: RoomId::from("r1"),
            source: SourceError::Rejected("banned".to_string()),
        };
        assert!(!rejected.is_transient());
    }
}
