//! # Builder Autosave
//!
//! Persists editor state without blocking editing.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐ mark_dirty ┌─────────────────────┐ save/load ┌───────────────────┐
//! │ EditorSession │ ─────────► │ AutosaveCoordinator │ ────────► │ dyn DocumentStore │
//! └───────────────┘            │  debounced task     │           ├───────────────────┤
//!         ▲                    └──────────┬──────────┘           │ HttpDocumentStore │
//!         │  AutosaveEvent::{Saved,Failed}│                      │ FileDocumentStore │
//!         └───────────────────────────────┘                      └───────────────────┘
//! ```
//!
//! Failures never reach the editing path as errors: they are reported as
//! [`AutosaveEvent::Failed`] and retried on the next dirty mark.
//!
//! Hosts end a session with [`AutosaveCoordinator::shutdown`], which waits for
//! the last save before the runtime goes away.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coordinator;
pub mod error;
pub mod http;
pub mod store;

pub use coordinator::{
    AutosaveConfig, AutosaveCoordinator, AutosaveEvent, AutosaveStatus, DEFAULT_QUIET_PERIOD,
};
pub use error::{PersistenceError, PersistenceResult};
pub use http::{HttpDocumentStore, RetryConfig};
pub use store::{DocumentStore, FileDocumentStore, SaveReceipt};
