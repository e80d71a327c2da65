//! Deterministic simulation harness for the thread engine.
//!
//! Provides simulation doubles for every seam the engine exposes, so the
//! exact production orchestration code runs against scripted inputs:
//!
//! - [`SimEnv`]: virtual clock implementing `Environment`
//! - [`ScriptedSource`]: `MessageSource` with queued replies and hold gates
//! - [`SimDriver`]: `Driver` with injected events and row-based layout
//! - [`invariants`]: snapshot-based invariant checks for any thread state
//!
//! Tests script an interleaving, run the real `Runtime` over it, and assert
//! on recorded scrolls, renders, and the resulting thread state.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
mod scripted_source;
mod sim_driver;
mod sim_env;

pub use scripted_source::{ScriptedSource, SourceCall};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
