//! Gesture interpretation.
//!
//! Turns raw input events into selection mutations or bulk-operation
//! triggers. Click routing is stateless; drag-move-together is an explicit
//! two-state machine (Idle -> Dragging -> Idle) with guarded transitions so
//! a double drag-start is structurally impossible.
//!
//! The host page's own drag-and-drop moves the visually dragged element;
//! this module only works out the applied time offset afterwards and plans
//! the matching shift for the rest of the selection.

use crate::matcher::{self, MatcherRule};
use crate::page::{NodeId, PageSnapshot};
use calbulk_core::{EventRef, EventTimes, SelectionSnapshot, ShiftParams};

/// Offsets smaller than this are treated as click-jitter, not a move.
pub const MIN_SHIFT_DELTA_MS: i64 = 5 * 60 * 1000;

/// The host day grid spans 24 hours vertically.
const HOURS_PER_GRID: f64 = 24.0;

const MS_PER_MINUTE: i64 = 60 * 1000;

/// Modifier keys held during a pointer or key event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub ctrl_or_meta: bool,
    pub shift: bool,
}

/// What a click on the page should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Not an event, or an unmodified click: the host handles it natively.
    PassThrough,
    Toggle(NodeId),
    RangeSelect(NodeId),
}

/// Route a click. Plain clicks always pass through to the host (they open
/// the native event detail); an unrecognized target is a no-op, never an
/// error.
pub fn interpret_click(
    page: &PageSnapshot,
    rules: &[MatcherRule],
    target: NodeId,
    modifiers: Modifiers,
    selection_is_empty: bool,
) -> ClickAction {
    let Some(event_node) = matcher::locate_event_element(page, rules, target) else {
        return ClickAction::PassThrough;
    };

    if modifiers.ctrl_or_meta {
        ClickAction::Toggle(event_node)
    } else if modifiers.shift && !selection_is_empty {
        ClickAction::RangeSelect(event_node)
    } else {
        ClickAction::PassThrough
    }
}

/// Keyboard shortcuts that mutate the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ClearSelection,
    SelectAllVisible,
}

pub fn interpret_key(key: &str, modifiers: Modifiers, selection_is_empty: bool) -> Option<KeyAction> {
    if key == "Escape" && !selection_is_empty {
        return Some(KeyAction::ClearSelection);
    }
    if modifiers.ctrl_or_meta && modifiers.shift && key.eq_ignore_ascii_case("a") {
        return Some(KeyAction::SelectAllVisible);
    }
    None
}

/// Context captured at drag start.
#[derive(Debug, Clone)]
pub struct DragContext {
    pub event: EventRef,
    pub start_y: f64,
    /// The dragged event's times before the host applied its own move,
    /// when the query succeeded.
    pub before: Option<EventTimes>,
}

/// Everything needed to settle a finished drag.
#[derive(Debug, Clone)]
pub struct DragDrop {
    pub event: EventRef,
    pub pixel_dy: f64,
    pub before: Option<EventTimes>,
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragContext),
}

/// The two-state drag machine. Single-item drags are left entirely to the
/// host's native behavior.
#[derive(Debug, Default)]
pub struct DragTracker {
    state: DragState,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Idle -> Dragging, guarded: the pressed element must be a selected
    /// event and the selection must have at least two members. Returns
    /// whether the transition happened.
    pub fn begin(
        &mut self,
        event: EventRef,
        start_y: f64,
        before: Option<EventTimes>,
        selection_len: usize,
        event_is_selected: bool,
    ) -> bool {
        if self.is_dragging() || selection_len < 2 || !event_is_selected {
            return false;
        }
        self.state = DragState::Dragging(DragContext {
            event,
            start_y,
            before,
        });
        true
    }

    /// Dragging -> Idle. Returns the drop context, or `None` when no drag
    /// was in progress.
    pub fn finish(&mut self, end_y: f64) -> Option<DragDrop> {
        match std::mem::take(&mut self.state) {
            DragState::Idle => None,
            DragState::Dragging(ctx) => Some(DragDrop {
                event: ctx.event,
                pixel_dy: end_y - ctx.start_y,
                before: ctx.before,
            }),
        }
    }

    /// Abort without producing a drop (e.g. selection cleared mid-drag).
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Estimate a time offset from vertical pixel displacement, rounded to the
/// nearest minute. Less reliable than the API difference; used only as the
/// fallback.
pub fn estimate_delta_from_pixels(pixel_dy: f64, grid_height: f64) -> i64 {
    let pixels_per_hour = grid_height.max(1.0) / HOURS_PER_GRID;
    let hours = pixel_dy / pixels_per_hour;
    (hours * 60.0).round() as i64 * MS_PER_MINUTE
}

/// The applied offset, preferring the authoritative before/after API start
/// difference and falling back to the pixel estimate.
pub fn resolve_time_delta(
    before: Option<&EventTimes>,
    after: Option<&EventTimes>,
    pixel_dy: f64,
    grid_height: f64,
) -> i64 {
    match (before, after) {
        (Some(before), Some(after)) => {
            (after.start.as_instant() - before.start.as_instant()).num_milliseconds()
        }
        _ => estimate_delta_from_pixels(pixel_dy, grid_height),
    }
}

/// Plan the shift for the rest of the selection: everything except the
/// dragged event (the host already moved it). Returns `None` when the
/// offset is below the jitter threshold or nothing else is selected.
pub fn plan_shift(
    selection: &SelectionSnapshot,
    dragged_event_id: &str,
    delta_ms: i64,
    min_delta_ms: i64,
) -> Option<ShiftParams> {
    if delta_ms.abs() < min_delta_ms {
        return None;
    }

    let events: Vec<EventRef> = selection
        .iter()
        .filter(|e| e.event_id != dragged_event_id)
        .map(|e| EventRef::new(&e.event_id, &e.calendar_id))
        .collect();

    if events.is_empty() {
        return None;
    }

    Some(ShiftParams { events, delta_ms })
}
