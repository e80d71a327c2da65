//! Message source seam.
//!
//! [`MessageSource`] abstracts the backing service a thread talks to. The
//! production implementation wraps a network client; the harness substitutes
//! a scripted source that resolves on command, so interleavings of loads,
//! sends and live arrivals are reproducible.

use std::future::Future;

use tidemark_core::{Cursor, Message, RoomId, SourceError};

/// Backing service for history loads and sends.
///
/// Implementations are shared across concurrent in-flight operations, so
/// methods take `&self`.
pub trait MessageSource: Send + Sync + 'static {
    /// Load a page of messages strictly older than `cursor`.
    ///
    /// The page is returned in ascending timestamp order. `cursor` is the id
    /// of a message a previous call returned (or `None` for the newest
    /// page). An empty page signals that history is exhausted.
    fn load_older(
        &self,
        room: RoomId,
        cursor: Option<Cursor>,
    ) -> impl Future<Output = Result<Vec<Message>, SourceError>> + Send;

    /// Send a message, resolving to its server-confirmed form.
    ///
    /// The confirmed message may carry a different id than any optimistic
    /// entry the caller is tracking.
    fn send(
        &self,
        room: RoomId,
        content: String,
    ) -> impl Future<Output = Result<Message, SourceError>> + Send;
}
