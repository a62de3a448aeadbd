//! Core types for the calbulk ecosystem.
//!
//! This crate provides the types shared between the page-facing engine and
//! the privileged agent binary:
//! - `EventRef`, `EventTime` and friends for addressing and shifting events
//! - `op` for bulk operation requests and their per-item outcomes
//! - `protocol` for the JSON request/response channel between contexts
//! - `agent` for spawning and calling the agent binary

pub mod agent;
pub mod error;
pub mod event;
pub mod op;
pub mod protocol;
pub mod selection;

pub use error::{CalbulkError, CalbulkResult};
pub use event::*;
pub use op::*;
pub use selection::*;
