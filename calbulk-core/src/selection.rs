//! Selection snapshot types.
//!
//! The engine's selection store is authoritative; these are the by-value
//! snapshots it publishes across the context boundary. Consumers always get
//! the full ordered list, never incremental diffs.

use serde::{Deserialize, Serialize};

/// One selected event as seen by snapshot consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedEvent {
    pub event_id: String,
    pub title: String,
    pub calendar_id: String,
}

/// Ordered snapshot of the current selection (insertion order).
pub type SelectionSnapshot = Vec<SelectedEvent>;

/// Channel payload for selection-changed broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChangedParams {
    pub selection: SelectionSnapshot,
}
