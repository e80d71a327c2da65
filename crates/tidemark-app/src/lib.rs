//! Application layer for tidemark
//!
//! Pure state machines and a generic runtime for chat thread orchestration:
//! infinite backward pagination behind a single-flight guard, optimistic
//! sends with rollback, scroll-anchor preservation across prepends, and
//! viewport inset tracking. The same state machine code runs in production
//! and in deterministic simulation.
//!
//! # Components
//!
//! - [`Thread`]: thread state machine (events in, actions out)
//! - [`Paginator`]: per-room backward-load state machine
//! - [`SendCoordinator`]: optimistic message synthesis
//! - [`ScrollAnchor`]: pure scroll geometry and policy
//! - [`InsetTracker`]: virtual-keyboard inset detection
//! - [`MessageSource`]: seam to the backing service (load/send)
//! - [`Driver`]: seam to platform I/O (events, layout, scroll, render)
//! - [`Runtime`]: generic orchestration loop using Driver and MessageSource

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod anchor;
mod driver;
mod event;
mod inset;
mod pagination;
mod runtime;
mod send;
mod source;
mod system_env;
mod thread;

pub use action::{AnchorDirective, ThreadAction};
pub use anchor::{Extent, PrependOutcome, ScrollAnchor, ScrollTarget};
pub use driver::Driver;
pub use event::ThreadEvent;
pub use inset::{InsetTracker, ViewportInset};
pub use pagination::{LoadCompletion, LoadRequest, PageState, Paginator};
pub use runtime::Runtime;
pub use send::SendCoordinator;
pub use source::MessageSource;
pub use system_env::SystemEnv;
pub use thread::{Thread, ThreadView};
