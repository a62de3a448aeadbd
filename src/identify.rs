//! Event identification.
//!
//! Derives a stable identifier, display title, and owning calendar from a
//! recognized event element. The host encodes `"<event-id> <calendar
//! address>"` as base64url in its id attribute on some views; decoding is
//! best-effort with graceful fallback to the raw value, never a guaranteed
//! parser. Elements with no id attribute at all get a synthetic id built
//! from geometry and a text snippet, which is explicitly unstable across
//! re-renders.

use crate::page::{NodeId, PageSnapshot};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use calbulk_core::{DEFAULT_CALENDAR_ID, EventRef};

/// Id attributes checked in priority order.
const ID_ATTRS: &[&str] = &["data-eventid", "data-eventchip"];

const CALENDAR_ATTR: &str = "data-calendarid";

/// Inner title class observed in the current host build.
const TITLE_CLASS: &str = "FAxxKc";

const UNTITLED: &str = "Untitled event";

/// Identity derived from one event element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentity {
    /// Stable within a session; synthetic ids are stable only until the
    /// host re-renders.
    pub event_id: String,
    pub title: String,
    pub calendar_id: String,
    /// The id attribute exactly as read from the host DOM, for debugging.
    pub raw_identifier: Option<String>,
    /// True when no host identifier existed and the id was derived from
    /// position and text.
    pub synthetic: bool,
}

impl EventIdentity {
    pub fn event_ref(&self) -> EventRef {
        EventRef::new(&self.event_id, &self.calendar_id)
    }
}

/// Derive identity for a recognized event element.
pub fn identify(
    page: &PageSnapshot,
    node: NodeId,
    default_calendar_id: Option<&str>,
) -> EventIdentity {
    let raw = ID_ATTRS.iter().find_map(|attr| page.attr(node, *attr));

    let (event_id, decoded_calendar, synthetic) = match raw {
        Some(raw) => match decode_composite_id(raw) {
            Some((event_id, calendar_id)) => (event_id, Some(calendar_id), false),
            None => (raw.to_string(), None, false),
        },
        None => (synthetic_id(page, node), None, true),
    };

    let calendar_id = page
        .attr(node, CALENDAR_ATTR)
        .map(str::to_string)
        .or(decoded_calendar)
        .or_else(|| default_calendar_id.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());

    EventIdentity {
        event_id,
        title: title_of(page, node),
        calendar_id,
        raw_identifier: raw.map(str::to_string),
        synthetic,
    }
}

/// Best-effort decode of a delimited base64url composite identifier.
/// Accepts the result only when it splits into an event id plus a trailing
/// token that looks like a calendar address.
pub fn decode_composite_id(raw: &str) -> Option<(String, String)> {
    let normalized = raw.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        normalized,
        "=".repeat((4 - normalized.len() % 4) % 4)
    );

    let decoded = STANDARD.decode(padded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let parts: Vec<&str> = decoded.split(' ').collect();
    if parts.len() < 2 {
        return None;
    }

    let calendar_id = parts[parts.len() - 1];
    if !looks_like_calendar_address(calendar_id) {
        return None;
    }

    let event_id = parts[..parts.len() - 1].join(" ");
    Some((event_id, calendar_id.to_string()))
}

fn looks_like_calendar_address(candidate: &str) -> bool {
    candidate.contains('@') || candidate.contains("calendar.google.com")
}

/// Position-and-text fallback id for markup with no identifier attribute.
fn synthetic_id(page: &PageSnapshot, node: NodeId) -> String {
    let rect = page.rect(node);
    let text = page.text_content(node);
    let snippet: String = text.chars().take(20).collect();
    format!("temp-{}-{}-{}", rect.top, rect.left, snippet)
}

/// First non-empty text from a prioritized set of inner elements.
fn title_of(page: &PageSnapshot, node: NodeId) -> String {
    let descendants = page.descendants_inclusive(node);

    let from_hidden = descendants
        .iter()
        .filter(|&&d| page.attr(d, "aria-hidden") == Some("true"))
        .map(|&d| page.text_content(d))
        .find(|t| !t.is_empty());
    if let Some(title) = from_hidden {
        return title;
    }

    let from_title_class = descendants
        .iter()
        .filter(|&&d| page.has_class(d, TITLE_CLASS))
        .map(|&d| page.text_content(d))
        .find(|t| !t.is_empty());
    if let Some(title) = from_title_class {
        return title;
    }

    let own = page.text_content(node);
    if own.is_empty() {
        UNTITLED.to_string()
    } else {
        own
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Element;

    #[test]
    fn test_decode_composite_base64url() {
        // "evt123 alice@gmail.com", base64url without padding.
        let raw = "ZXZ0MTIzIGFsaWNlQGdtYWlsLmNvbQ";

        assert_eq!(
            decode_composite_id(raw),
            Some(("evt123".to_string(), "alice@gmail.com".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_non_calendar_tail() {
        // "hello world" decodes fine but the tail is no calendar address.
        assert_eq!(decode_composite_id("aGVsbG8gd29ybGQ"), None);
        // Not base64 at all.
        assert_eq!(decode_composite_id("!!not-base64!!"), None);
    }

    #[test]
    fn test_identify_prefers_attribute_and_decodes() {
        let mut page = PageSnapshot::new();
        let node = page.push(
            None,
            Element::new("div")
                .attr("data-eventid", "ZXZ0MTIzIGFsaWNlQGdtYWlsLmNvbQ")
                .text("Standup"),
        );

        let identity = identify(&page, node, None);
        assert_eq!(identity.event_id, "evt123");
        assert_eq!(identity.calendar_id, "alice@gmail.com");
        assert_eq!(identity.title, "Standup");
        assert_eq!(
            identity.raw_identifier.as_deref(),
            Some("ZXZ0MTIzIGFsaWNlQGdtYWlsLmNvbQ")
        );
        assert!(!identity.synthetic);
    }

    #[test]
    fn test_identify_keeps_raw_id_when_not_composite() {
        let mut page = PageSnapshot::new();
        let node = page.push(None, Element::new("div").attr("data-eventid", "plain-id-7"));

        let identity = identify(&page, node, Some("work@group.calendar.google.com"));
        assert_eq!(identity.event_id, "plain-id-7");
        // No attribute, no composite: configured default wins over primary.
        assert_eq!(identity.calendar_id, "work@group.calendar.google.com");
    }

    #[test]
    fn test_explicit_calendar_attribute_wins() {
        let mut page = PageSnapshot::new();
        let node = page.push(
            None,
            Element::new("div")
                .attr("data-eventid", "e1")
                .attr("data-calendarid", "team@example.com"),
        );

        let identity = identify(&page, node, Some("other@example.com"));
        assert_eq!(identity.calendar_id, "team@example.com");
    }

    #[test]
    fn test_synthetic_id_from_geometry_and_text() {
        let mut page = PageSnapshot::new();
        let node = page.push(
            None,
            Element::new("div")
                .class("WjJeHe")
                .text("Lunch with a very long title here")
                .rect(120.0, 340.0, 80.0, 20.0),
        );

        let identity = identify(&page, node, None);
        assert!(identity.synthetic);
        assert_eq!(identity.event_id, "temp-120-340-Lunch with a very lo");
        assert_eq!(identity.calendar_id, DEFAULT_CALENDAR_ID);
        assert_eq!(identity.raw_identifier, None);
    }

    #[test]
    fn test_title_prefers_aria_hidden_then_title_class() {
        let mut page = PageSnapshot::new();
        let node = page.push(None, Element::new("div").attr("data-eventid", "e1"));
        page.push(Some(node), Element::new("span").class("FAxxKc").text("From class"));
        page.push(
            Some(node),
            Element::new("span")
                .attr("aria-hidden", "true")
                .text("From hidden"),
        );

        assert_eq!(identify(&page, node, None).title, "From hidden");
    }

    #[test]
    fn test_untitled_fallback() {
        let mut page = PageSnapshot::new();
        let node = page.push(None, Element::new("div").attr("data-eventid", "e1"));

        assert_eq!(identify(&page, node, None).title, "Untitled event");
    }
}
