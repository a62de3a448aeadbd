//! Event-element matching.
//!
//! The host page marks event chips inconsistently across views and
//! redesigns, so recognition is a prioritized list of structural rules
//! rather than a single selector. The list is data: new host markup
//! patterns are added as rules (configuration), not as new branches.

use crate::page::{NodeId, PageSnapshot};
use serde::{Deserialize, Serialize};

/// One structural rule for recognizing an event-representing element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatcherRule {
    /// Element carries the named attribute.
    HasAttr { name: String },
    /// Element has the given role and carries the named attribute.
    RoleWithAttr { role: String, attr: String },
    /// Class-based fallback for markup without data attributes.
    HasClass { name: String },
}

impl MatcherRule {
    pub fn matches(&self, page: &PageSnapshot, id: NodeId) -> bool {
        match self {
            MatcherRule::HasAttr { name } => page.attr(id, name).is_some(),
            MatcherRule::RoleWithAttr { role, attr } => {
                page.role(id) == Some(role.as_str()) && page.attr(id, attr).is_some()
            }
            MatcherRule::HasClass { name } => page.has_class(id, name),
        }
    }
}

/// Default rule set for the current host markup, highest priority first.
pub fn default_rules() -> Vec<MatcherRule> {
    vec![
        MatcherRule::HasAttr {
            name: "data-eventid".to_string(),
        },
        MatcherRule::HasAttr {
            name: "data-eventchip".to_string(),
        },
        MatcherRule::RoleWithAttr {
            role: "button".to_string(),
            attr: "data-eventid".to_string(),
        },
        // Obfuscated chip class observed in the current host build.
        MatcherRule::HasClass {
            name: "WjJeHe".to_string(),
        },
    ]
}

/// Walk up from an arbitrary input target and return the first enclosing
/// element any rule recognizes as a calendar event, trying rules in
/// priority order.
pub fn locate_event_element(
    page: &PageSnapshot,
    rules: &[MatcherRule],
    target: NodeId,
) -> Option<NodeId> {
    for rule in rules {
        for candidate in page.ancestors_inclusive(target) {
            if rule.matches(page, candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Deduplicated union of all rule matches, in document order. This is the
/// ordering basis for range selection and select-all.
pub fn list_visible_events(page: &PageSnapshot, rules: &[MatcherRule]) -> Vec<NodeId> {
    page.document_order()
        .into_iter()
        .filter(|&id| rules.iter().any(|rule| rule.matches(page, id)))
        .collect()
}
