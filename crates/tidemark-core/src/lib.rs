//! Core data model for the tidemark chat thread engine.
//!
//! Pure, synchronous building blocks shared by the application layer and the
//! simulation harness: messages, the per-room message store, configuration,
//! errors, and the environment abstraction for deterministic time.
//!
//! Nothing in this crate performs I/O. All store operations are total; the
//! store has no knowledge of network state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod message;
pub mod store;

pub use config::ThreadConfig;
pub use env::Environment;
pub use error::{SourceError, ThreadError};
pub use message::{Cursor, DeliveryState, Direction, Message, MessageId};
pub use store::{MessageStore, RoomId, RoomLog};
