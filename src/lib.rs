//! tend - GTD task management core
//!
//! This library provides the shared state and domain logic for the tend
//! applications: the canonical task/project collections, dependency
//! resolution, review staleness, and debounced persistence through a
//! pluggable storage adapter.
//!
//! # Core Concepts
//!
//! - **Tasks and Projects**: soft-deleted records referencing each other
//!   by id; dangling references are tolerated, never fatal
//! - **Blocking**: tasks list blocker ids; cycles are treated as a
//!   permanent blocked state rather than an error
//! - **Review**: next/waiting tasks and active projects that have gone
//!   stale surface during weekly review
//! - **Debounced persistence**: mutations coalesce into a single save
//!   through the [`storage::StorageAdapter`] contract
//!
//! # Module Organization
//!
//! - `model`: task/project/area/settings data model and the `AppData` blob
//! - `store`: in-memory store with debounced, coalesced persistence
//! - `storage`: storage adapter contract plus memory and file adapters
//! - `dependency`: blocked-state and cycle resolution over the task graph
//! - `project`: active-project classification and project filters
//! - `review`: stale-item computation for review prompts
//! - `pomodoro`: two-phase focus/break countdown state machine
//! - `attachment`: attachment upload validation
//! - `id`: UUID generation with a non-crypto fallback
//! - `error`: error types and result aliases

pub mod attachment;
pub mod dependency;
pub mod error;
pub mod id;
pub mod model;
pub mod pomodoro;
pub mod project;
pub mod review;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
