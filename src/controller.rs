//! Operation controller.
//!
//! Wires the selection store, gesture tracker, and agent channel together.
//! Holds no global state: everything it needs is injected at construction,
//! and every method works off the injected pieces, so units stay
//! independently testable.

use crate::config::EngineConfig;
use crate::gesture::{self, DragTracker};
use crate::identify::{self, EventIdentity};
use crate::matcher;
use crate::page::{NodeId, PageSnapshot};
use crate::selection::SelectionStore;
use calbulk_core::agent::AgentChannel;
use calbulk_core::protocol::{AuthStatus, Command};
use calbulk_core::{
    BulkOutcome, BulkRequest, Calendar, CalbulkError, CalbulkResult, EventRef, EventTimeParams,
    EventTimePayload, EventTimes, MoveParams, OperationKind, SelectionChangedParams, ShiftParams,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// What the UI shows after a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub outcome: BulkOutcome,
    /// e.g. "Deleted 2 events"
    pub summary: String,
    /// Actionable failure hint, present only when something failed.
    pub hint: Option<String>,
}

/// Build the user-facing report for a finished bulk operation.
pub fn summarize(verb_past: &str, outcome: BulkOutcome) -> OperationReport {
    let n = outcome.succeeded.len();
    let summary = format!(
        "{} {} event{}",
        verb_past,
        n,
        if n == 1 { "" } else { "s" }
    );
    let hint = if outcome.failed.is_empty() {
        None
    } else {
        Some(format!(
            "{} failed (may already be deleted / check permissions)",
            outcome.failed.len()
        ))
    };
    OperationReport {
        outcome,
        summary,
        hint,
    }
}

pub struct Controller {
    channel: AgentChannel,
    config: EngineConfig,
    pub store: SelectionStore,
    tracker: DragTracker,
}

impl Controller {
    pub fn new(channel: AgentChannel, config: EngineConfig) -> Self {
        Controller {
            channel,
            config,
            store: SelectionStore::new(),
            tracker: DragTracker::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- auth passthrough ----

    pub async fn check_auth(&self) -> CalbulkResult<bool> {
        let status: AuthStatus = self
            .channel
            .call(Command::CheckAuth, serde_json::json!({}))
            .await?;
        Ok(status.authenticated)
    }

    pub async fn sign_in(&self) -> CalbulkResult<()> {
        self.channel
            .call::<serde_json::Value>(Command::SignIn, serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn sign_out(&self) -> CalbulkResult<()> {
        self.channel
            .call::<serde_json::Value>(Command::SignOut, serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn list_calendars(&self) -> CalbulkResult<Vec<Calendar>> {
        self.channel
            .call(Command::ListCalendars, serde_json::json!({}))
            .await
    }

    // ---- selection gestures ----

    /// Identify the event element and toggle it.
    pub fn toggle_at(&mut self, page: &PageSnapshot, event_node: NodeId) {
        let identity = self.identify(page, event_node);
        self.store.toggle(identity, event_node);
    }

    /// Range-select from the current anchor to the clicked element.
    pub fn range_to(&mut self, page: &PageSnapshot, event_node: NodeId) {
        let target = (self.identify(page, event_node), event_node);
        let visible = self.visible_identified(page);
        self.store.add_range(target, &visible);
    }

    pub fn select_all_visible(&mut self, page: &PageSnapshot) {
        let visible = self.visible_identified(page);
        self.store.select_all(&visible);
    }

    /// Clear the live selection (the authoritative store) and ask the agent
    /// to drop its persisted mirror too. A failed notification only leaves
    /// the mirror stale until the next broadcast overwrites it.
    pub async fn clear_selection(&mut self) {
        self.store.clear();
        self.tracker.reset();
        if let Err(e) = self
            .channel
            .notify(Command::ClearSelection, serde_json::json!({}))
            .await
        {
            debug!("clear notification dropped: {}", e);
        }
    }

    /// Rebind selection marks after a host re-render.
    pub fn reconcile(&mut self, page: &PageSnapshot) {
        self.store.reconcile(
            page,
            &self.config.matchers,
            self.config.default_calendar_id.as_deref(),
        );
    }

    /// Push the current snapshot to the agent so decoupled UI surfaces can
    /// render it. At-most-once: delivery failure is logged and ignored.
    pub async fn broadcast_selection(&self) {
        let params = SelectionChangedParams {
            selection: self.store.snapshot(),
        };
        let params = match serde_json::to_value(&params) {
            Ok(v) => v,
            Err(e) => {
                debug!("selection snapshot not serializable: {}", e);
                return;
            }
        };
        if let Err(e) = self.channel.notify(Command::SelectionChanged, params).await {
            debug!("selection broadcast dropped: {}", e);
        }
    }

    // ---- bulk operations ----

    /// Delete every selected event. Destructive, so the caller must pass
    /// explicit confirmation gathered from the user.
    pub async fn delete_selected(&mut self, confirmed: bool) -> CalbulkResult<OperationReport> {
        if !confirmed {
            return Err(CalbulkError::Refused(
                "bulk delete requires explicit confirmation".to_string(),
            ));
        }
        let events = self.require_selection()?;

        self.execute(
            BulkRequest {
                events,
                operation: OperationKind::Delete,
            },
            true,
        )
        .await
    }

    /// Move the selection to another calendar and/or a new absolute start.
    pub async fn move_selected(
        &mut self,
        target_calendar_id: Option<String>,
        new_start: Option<DateTime<Utc>>,
    ) -> CalbulkResult<OperationReport> {
        if target_calendar_id.is_none() && new_start.is_none() {
            return Err(CalbulkError::Refused(
                "move requires a target calendar or a new start time".to_string(),
            ));
        }
        let events = self.require_selection()?;

        self.dispatch_move(MoveParams {
            events,
            target_calendar_id,
            new_start,
        })
        .await
    }

    async fn dispatch_move(&mut self, params: MoveParams) -> CalbulkResult<OperationReport> {
        let outcome: BulkOutcome = self
            .channel
            .call(
                Command::MoveEvents,
                serde_json::to_value(&params)
                    .map_err(|e| CalbulkError::Serialization(e.to_string()))?,
            )
            .await?;

        self.finish_bulk("Moved", outcome).await
    }

    /// Shift every selected event by a signed offset, optionally excluding
    /// one id (used when the host already moved that event itself).
    pub async fn shift_selected(
        &mut self,
        delta_ms: i64,
        exclude_event_id: Option<&str>,
    ) -> CalbulkResult<OperationReport> {
        let events: Vec<EventRef> = self
            .require_selection()?
            .into_iter()
            .filter(|e| Some(e.event_id.as_str()) != exclude_event_id)
            .collect();
        if events.is_empty() {
            return Err(CalbulkError::Refused("nothing selected".to_string()));
        }

        self.dispatch_shift(ShiftParams { events, delta_ms }).await
    }

    async fn dispatch_shift(&mut self, params: ShiftParams) -> CalbulkResult<OperationReport> {
        let outcome: BulkOutcome = self
            .channel
            .call(
                Command::ShiftEventsByDelta,
                serde_json::to_value(&params)
                    .map_err(|e| CalbulkError::Serialization(e.to_string()))?,
            )
            .await?;

        self.finish_bulk("Moved", outcome).await
    }

    /// Dispatch a prepared bulk request. Entry point for embedders that
    /// build the request themselves instead of going through the selection
    /// helpers above; deletion still demands explicit confirmation.
    pub async fn execute(
        &mut self,
        request: BulkRequest,
        confirmed: bool,
    ) -> CalbulkResult<OperationReport> {
        if request.events.is_empty() {
            return Err(CalbulkError::Refused("empty bulk request".to_string()));
        }

        match request.operation {
            OperationKind::Delete => {
                if !confirmed {
                    return Err(CalbulkError::Refused(
                        "bulk delete requires explicit confirmation".to_string(),
                    ));
                }
                let outcome: BulkOutcome = self
                    .channel
                    .call(
                        Command::DeleteEvents,
                        serde_json::json!({ "events": request.events }),
                    )
                    .await?;
                self.finish_bulk("Deleted", outcome).await
            }
            OperationKind::MoveCalendar { target } => {
                self.dispatch_move(MoveParams {
                    events: request.events,
                    target_calendar_id: Some(target),
                    new_start: None,
                })
                .await
            }
            OperationKind::Reschedule { new_start } => {
                self.dispatch_move(MoveParams {
                    events: request.events,
                    target_calendar_id: None,
                    new_start: Some(new_start),
                })
                .await
            }
            OperationKind::ShiftByDelta { delta_ms } => {
                self.dispatch_shift(ShiftParams {
                    events: request.events,
                    delta_ms,
                })
                .await
            }
        }
    }

    // ---- drag-move-together ----

    /// Pointer-down on a selected event: try to enter the drag state and
    /// capture the dragged event's pre-drag times.
    pub async fn begin_drag(
        &mut self,
        page: &PageSnapshot,
        event_node: NodeId,
        pointer_y: f64,
    ) -> bool {
        let identity = self.identify(page, event_node);
        let selected = self.store.contains(&identity.event_id);
        let event = identity.event_ref();

        // Best-effort: a failed read only disables the authoritative delta.
        let before = if selected && self.store.len() >= 2 {
            self.fetch_event_times(&event).await
        } else {
            None
        };

        self.tracker
            .begin(event, pointer_y, before, self.store.len(), selected)
    }

    /// Pointer-up/drag-end: wait for the host to finish its own move, work
    /// out the applied offset, and shift the rest of the selection by it.
    /// Returns `None` when the drop resolved to a no-op.
    pub async fn end_drag(
        &mut self,
        page: &PageSnapshot,
        pointer_y: f64,
    ) -> CalbulkResult<Option<OperationReport>> {
        let Some(drop) = self.tracker.finish(pointer_y) else {
            return Ok(None);
        };

        tokio::time::sleep(self.config.settle_delay()).await;

        let after = self.fetch_event_times(&drop.event).await;
        let delta_ms = gesture::resolve_time_delta(
            drop.before.as_ref(),
            after.as_ref(),
            drop.pixel_dy,
            page.grid_height(),
        );

        let Some(plan) = gesture::plan_shift(
            &self.store.snapshot(),
            &drop.event.event_id,
            delta_ms,
            self.config.min_shift_delta_ms(),
        ) else {
            debug!(delta_ms, "drag resolved to a no-op");
            return Ok(None);
        };

        self.dispatch_shift(plan).await.map(Some)
    }

    // ---- helpers ----

    fn identify(&self, page: &PageSnapshot, node: NodeId) -> EventIdentity {
        identify::identify(page, node, self.config.default_calendar_id.as_deref())
    }

    fn visible_identified(&self, page: &PageSnapshot) -> Vec<(EventIdentity, NodeId)> {
        matcher::list_visible_events(page, &self.config.matchers)
            .into_iter()
            .map(|node| (self.identify(page, node), node))
            .collect()
    }

    fn require_selection(&self) -> CalbulkResult<Vec<EventRef>> {
        let events = self.store.event_refs();
        if events.is_empty() {
            return Err(CalbulkError::Refused("nothing selected".to_string()));
        }
        Ok(events)
    }

    async fn fetch_event_times(&self, event: &EventRef) -> Option<EventTimes> {
        let params = serde_json::to_value(EventTimeParams {
            event: event.clone(),
        })
        .ok()?;

        match self
            .channel
            .call::<EventTimePayload>(Command::GetEventTime, params)
            .await
        {
            Ok(payload) => Some(EventTimes {
                start: payload.start,
                end: payload.end,
            }),
            Err(e) => {
                debug!("event time query failed: {}", e);
                None
            }
        }
    }

    /// Drop succeeded ids from the store (failed ones stay selected until
    /// the user clears them) and announce completion so the agent prunes
    /// its persisted snapshot to match. Best-effort, like every broadcast.
    async fn finish_bulk(
        &mut self,
        verb_past: &str,
        outcome: BulkOutcome,
    ) -> CalbulkResult<OperationReport> {
        let succeeded: Vec<String> = outcome.succeeded.clone();
        self.store
            .remove_ids(succeeded.iter().map(String::as_str));

        let params = serde_json::json!({ "succeeded": succeeded });
        if let Err(e) = self.channel.notify(Command::OperationComplete, params).await {
            debug!("operation-complete announcement dropped: {}", e);
        }

        Ok(summarize(verb_past, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbulk_core::ItemFailure;

    fn outcome(succeeded: &[&str], failed: &[(&str, &str)]) -> BulkOutcome {
        BulkOutcome {
            succeeded: succeeded.iter().map(|s| s.to_string()).collect(),
            failed: failed
                .iter()
                .map(|(id, error)| ItemFailure {
                    event_id: id.to_string(),
                    error: error.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_summarize_success_counts() {
        let report = summarize("Deleted", outcome(&["e1", "e2"], &[]));
        assert_eq!(report.summary, "Deleted 2 events");
        assert_eq!(report.hint, None);
    }

    #[test]
    fn test_summarize_partial_failure_has_hint() {
        let report = summarize("Deleted", outcome(&["e1", "e2"], &[("e3", "not found")]));
        assert_eq!(report.summary, "Deleted 2 events");
        assert_eq!(
            report.hint.as_deref(),
            Some("1 failed (may already be deleted / check permissions)")
        );
    }

    #[test]
    fn test_summarize_singular() {
        let report = summarize("Moved", outcome(&["e1"], &[]));
        assert_eq!(report.summary, "Moved 1 event");
    }

    #[tokio::test]
    async fn test_execute_refuses_unconfirmed_delete() {
        let mut controller = Controller::new(AgentChannel::new(), EngineConfig::default());
        let request = BulkRequest {
            events: vec![EventRef::primary("e1")],
            operation: OperationKind::Delete,
        };

        let result = controller.execute(request, false).await;
        assert!(matches!(result, Err(CalbulkError::Refused(_))));
    }

    #[tokio::test]
    async fn test_execute_refuses_empty_request() {
        let mut controller = Controller::new(AgentChannel::new(), EngineConfig::default());
        let request = BulkRequest {
            events: Vec::new(),
            operation: OperationKind::ShiftByDelta { delta_ms: 600_000 },
        };

        let result = controller.execute(request, true).await;
        assert!(matches!(result, Err(CalbulkError::Refused(_))));
    }

    #[tokio::test]
    async fn test_clear_selection_clears_store_even_when_agent_unreachable() {
        use crate::page::Element;

        let channel = AgentChannel::with_binary("calbulk-agent-nonexistent");
        let mut controller = Controller::new(channel, EngineConfig::default());

        let mut page = PageSnapshot::new();
        let chip = page.push(None, Element::new("div").attr("data-eventid", "e1"));
        controller.toggle_at(&page, chip);
        assert!(!controller.store.is_empty());

        // The notify to the missing agent fails silently; the live store
        // must still end up empty.
        controller.clear_selection().await;
        assert!(controller.store.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_ops_refuse_empty_selection() {
        let mut controller = Controller::new(AgentChannel::new(), EngineConfig::default());

        assert!(matches!(
            controller.delete_selected(true).await,
            Err(CalbulkError::Refused(_))
        ));
        assert!(matches!(
            controller.move_selected(None, None).await,
            Err(CalbulkError::Refused(_))
        ));
        assert!(matches!(
            controller.shift_selected(600_000, None).await,
            Err(CalbulkError::Refused(_))
        ));
    }
}
