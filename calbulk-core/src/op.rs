//! Bulk operation requests and per-item outcomes.

use crate::event::{EventRef, EventTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider rate/size limit: operations issued concurrently per chunk.
pub const BATCH_CHUNK_SIZE: usize = 50;

/// What a bulk request does to each addressed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    Delete,
    MoveCalendar { target: String },
    Reschedule { new_start: DateTime<Utc> },
    ShiftByDelta { delta_ms: i64 },
}

/// A transient bulk request, created per user action and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRequest {
    pub events: Vec<EventRef>,
    pub operation: OperationKind,
}

/// One event's failure inside a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub event_id: String,
    pub error: String,
}

/// Aggregated outcome of a bulk operation.
///
/// Invariant: every input event id appears in exactly one of `succeeded`
/// and `failed`. Partial failure is the expected path, not an exception.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl BulkOutcome {
    pub fn record_success(&mut self, event_id: impl Into<String>) {
        self.succeeded.push(event_id.into());
    }

    pub fn record_failure(&mut self, event_id: impl Into<String>, error: impl Into<String>) {
        self.failed.push(ItemFailure {
            event_id: event_id.into(),
            error: error.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Check the total-accounting invariant against the request's ids.
    pub fn accounts_for<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        use std::collections::HashSet;

        let succeeded: HashSet<&str> = self.succeeded.iter().map(String::as_str).collect();
        let failed: HashSet<&str> = self.failed.iter().map(|f| f.event_id.as_str()).collect();
        if !succeeded.is_disjoint(&failed) {
            return false;
        }

        let inputs: HashSet<&str> = ids.into_iter().collect();
        let mut union = succeeded;
        union.extend(&failed);
        union == inputs
    }
}

/// Parameters for a move/reschedule bulk request as sent over the channel.
/// At least one of `target_calendar_id` and `new_start` must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveParams {
    pub events: Vec<EventRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_start: Option<DateTime<Utc>>,
}

/// Parameters for a shift-by-delta bulk request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftParams {
    pub events: Vec<EventRef>,
    pub delta_ms: i64,
}

/// Parameters for a single-event time query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimeParams {
    pub event: EventRef,
}

/// Response payload for a single-event time query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimePayload {
    pub start: EventTime,
    pub end: EventTime,
}

/// Channel payload announcing a finished bulk operation: the ids that
/// succeeded and should no longer appear in any selection view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCompleteParams {
    pub succeeded: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accounting_total_and_exclusive() {
        let mut outcome = BulkOutcome::default();
        outcome.record_success("e1");
        outcome.record_success("e2");
        outcome.record_failure("e3", "not found");

        assert!(outcome.accounts_for(["e1", "e2", "e3"]));
        assert_eq!(outcome.total(), 3);
    }

    #[test]
    fn test_outcome_accounting_rejects_missing_and_overlap() {
        let mut outcome = BulkOutcome::default();
        outcome.record_success("e1");
        assert!(!outcome.accounts_for(["e1", "e2"]));

        outcome.record_failure("e1", "duplicate accounting");
        assert!(!outcome.accounts_for(["e1"]));
    }
}
