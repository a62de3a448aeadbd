//! Observed host-page model.
//!
//! The host calendar's DOM is a third-party, unstable structure we only
//! read. The embedder (browser bridge) captures it as a [`PageSnapshot`]:
//! an arena of nodes with tags, attributes, classes, text, and on-screen
//! geometry. Node ids are only meaningful within the snapshot they came
//! from; after a host re-render the embedder supplies a fresh snapshot and
//! stale references must be reconciled by stable event identifier.

use std::collections::HashMap;

/// Handle to a node within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// On-screen bounding box, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// One observed element.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub classes: Vec<String>,
    /// Text directly inside this element (not descendants).
    pub text: String,
    pub rect: Rect,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn class(mut self, name: impl Into<String>) -> Self {
        self.classes.push(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn rect(mut self, top: f64, left: f64, width: f64, height: f64) -> Self {
        self.rect = Rect {
            top,
            left,
            width,
            height,
        };
        self
    }
}

struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable capture of the host page at one instant.
pub struct PageSnapshot {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    /// Height of the day grid, used for pixel-to-time estimation.
    grid_height: f64,
}

/// Grid height assumed when the host grid cannot be measured.
pub const DEFAULT_GRID_HEIGHT: f64 = 1000.0;

impl Default for PageSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSnapshot {
    pub fn new() -> Self {
        PageSnapshot {
            nodes: Vec::new(),
            roots: Vec::new(),
            grid_height: DEFAULT_GRID_HEIGHT,
        }
    }

    pub fn with_grid_height(grid_height: f64) -> Self {
        PageSnapshot {
            grid_height,
            ..Self::new()
        }
    }

    pub fn grid_height(&self) -> f64 {
        self.grid_height
    }

    /// Append an element under `parent` (or as a root). Children keep the
    /// order they are pushed in, which is the host's document order.
    pub fn push(&mut self, parent: Option<NodeId>, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            element,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent_id) => self.nodes[parent_id.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).map(|n| &n.element)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn role(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "role")
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.element(id).map(|e| e.rect).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// The node and its ancestors, nearest first.
    pub fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.contains(id).then_some(id);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.parent(id);
            Some(id)
        })
    }

    /// All nodes in document (preorder) order.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    /// The node and its descendants in document order.
    pub fn descendants_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    /// Concatenated own and descendant text, document order, trimmed.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants_inclusive(id) {
            let text = self.nodes[node.0].element.text.trim();
            if !text.is_empty() {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        out
    }
}
