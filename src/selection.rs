//! Selection state store.
//!
//! An ordered mapping from event id to selection metadata. Insertion order
//! defines the range-selection anchor (most recently added entry). DOM
//! references are non-owning and per-snapshot; `reconcile` rebinds them
//! after the host re-renders. Every mutation publishes the full ordered
//! snapshot to the subscriber — consumers never see diffs.

use crate::identify::{self, EventIdentity};
use crate::matcher::{self, MatcherRule};
use crate::page::{NodeId, PageSnapshot};
use calbulk_core::{EventRef, SelectedEvent, SelectionSnapshot};
use std::collections::HashMap;

/// One selected event and its (possibly stale) backing element.
#[derive(Debug, Clone)]
pub struct SelectionEntry {
    pub identity: EventIdentity,
    /// Valid only for the snapshot it was bound against; `None` when the
    /// entry is selected logically but currently unmarked.
    pub node: Option<NodeId>,
}

type Subscriber = Box<dyn Fn(&SelectionSnapshot) + Send>;

#[derive(Default)]
pub struct SelectionStore {
    entries: HashMap<String, SelectionEntry>,
    /// Insertion order; the last id is the range anchor.
    order: Vec<String>,
    subscriber: Option<Subscriber>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the snapshot consumer. At-most-once delivery: the callback
    /// must not assume it sees every change.
    pub fn set_subscriber(&mut self, subscriber: impl Fn(&SelectionSnapshot) + Send + 'static) {
        self.subscriber = Some(Box::new(subscriber));
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.entries.contains_key(event_id)
    }

    /// The current range anchor: the most recently added entry.
    pub fn anchor(&self) -> Option<&str> {
        self.order.last().map(String::as_str)
    }

    /// Full ordered snapshot (insertion order).
    pub fn snapshot(&self) -> SelectionSnapshot {
        self.order
            .iter()
            .map(|id| {
                let identity = &self.entries[id].identity;
                SelectedEvent {
                    event_id: identity.event_id.clone(),
                    title: identity.title.clone(),
                    calendar_id: identity.calendar_id.clone(),
                }
            })
            .collect()
    }

    /// Remote-addressable refs for every selected event, in order.
    pub fn event_refs(&self) -> Vec<EventRef> {
        self.order
            .iter()
            .map(|id| self.entries[id].identity.event_ref())
            .collect()
    }

    /// Nodes currently bound, for the embedder to paint selection marks.
    pub fn marked_nodes(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .filter_map(|id| self.entries[id].node)
            .collect()
    }

    /// Add if absent (becoming the new anchor), remove if present.
    /// Returns whether the event is selected afterwards.
    pub fn toggle(&mut self, identity: EventIdentity, node: NodeId) -> bool {
        let event_id = identity.event_id.clone();
        let selected = if self.entries.remove(&event_id).is_some() {
            self.order.retain(|id| id != &event_id);
            false
        } else {
            self.insert(identity, node);
            true
        };
        self.notify();
        selected
    }

    /// Select the inclusive span between the anchor and `target` within the
    /// supplied visible ordering, whichever direction the span runs.
    /// Degrades to a toggle on the target when either endpoint is missing
    /// from that ordering (documented fallback, not an error).
    pub fn add_range(
        &mut self,
        target: (EventIdentity, NodeId),
        visible: &[(EventIdentity, NodeId)],
    ) {
        let (target_identity, target_node) = target;

        let anchor_pos = self
            .anchor()
            .and_then(|anchor| visible.iter().position(|(i, _)| i.event_id == anchor));
        let target_pos = visible
            .iter()
            .position(|(i, _)| i.event_id == target_identity.event_id);

        let (Some(anchor_pos), Some(target_pos)) = (anchor_pos, target_pos) else {
            self.toggle(target_identity, target_node);
            return;
        };

        let (lo, hi) = if anchor_pos <= target_pos {
            (anchor_pos, target_pos)
        } else {
            (target_pos, anchor_pos)
        };

        for (identity, node) in &visible[lo..=hi] {
            if !self.contains(&identity.event_id) {
                self.insert(identity.clone(), *node);
            }
        }
        self.notify();
    }

    /// Select every event in the supplied visible ordering.
    pub fn select_all(&mut self, visible: &[(EventIdentity, NodeId)]) {
        for (identity, node) in visible {
            if !self.contains(&identity.event_id) {
                self.insert(identity.clone(), *node);
            }
        }
        self.notify();
    }

    /// Empty the set, releasing every DOM back-reference.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.notify();
    }

    /// Drop the given ids (e.g. the succeeded half of a bulk outcome),
    /// keeping everything else selected.
    pub fn remove_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let mut removed = false;
        for id in ids {
            if self.entries.remove(id).is_some() {
                self.order.retain(|o| o != id);
                removed = true;
            }
        }
        if removed {
            self.notify();
        }
    }

    /// Rebind stale element references against a fresh snapshot. Entries
    /// whose identifier cannot be relocated stay selected logically but
    /// unmarked until a later reconcile finds them again.
    pub fn reconcile(
        &mut self,
        page: &PageSnapshot,
        rules: &[MatcherRule],
        default_calendar_id: Option<&str>,
    ) {
        let mut by_id: HashMap<String, NodeId> = HashMap::new();
        for node in matcher::list_visible_events(page, rules) {
            let identity = identify::identify(page, node, default_calendar_id);
            by_id.entry(identity.event_id).or_insert(node);
        }

        for entry in self.entries.values_mut() {
            entry.node = by_id.get(&entry.identity.event_id).copied();
        }
    }

    fn insert(&mut self, identity: EventIdentity, node: NodeId) {
        let event_id = identity.event_id.clone();
        self.entries.insert(
            event_id.clone(),
            SelectionEntry {
                identity,
                node: Some(node),
            },
        );
        self.order.push(event_id);
    }

    fn notify(&self) {
        if let Some(subscriber) = &self.subscriber {
            subscriber(&self.snapshot());
        }
    }
}
