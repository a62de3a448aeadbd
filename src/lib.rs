//! calbulk - multi-select bulk operations for a hosted web calendar.
//!
//! The host calendar has no native multi-select. This crate is the
//! page-facing engine that adds one: it models the observed host DOM,
//! recognizes and identifies event elements, tracks an ordered selection
//! that survives host re-renders, and interprets click/keyboard/drag
//! gestures into bulk operations. The operations themselves run in a
//! separate privileged context (`calbulk-agent`), reached over a JSON
//! request/response channel; per-item success and failure come back as a
//! single aggregated outcome.
//!
//! The host page is treated as an untrusted external system: the engine
//! only reads snapshots of it and revalidates every element reference
//! before use.

pub mod config;
pub mod controller;
pub mod gesture;
pub mod identify;
pub mod matcher;
pub mod page;
pub mod selection;

pub use config::EngineConfig;
pub use controller::{Controller, OperationReport};
pub use gesture::{ClickAction, DragTracker, KeyAction, Modifiers};
pub use identify::EventIdentity;
pub use matcher::MatcherRule;
pub use page::{Element, NodeId, PageSnapshot};
pub use selection::SelectionStore;
