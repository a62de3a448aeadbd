//! Event addressing and time types.
//!
//! Remote operations address events by `(calendar_id, event_id)`. Times keep
//! the provider's distinction between timed events (`DateTime` plus an
//! optional IANA time zone) and all-day events (`Date`), and every shift or
//! reschedule preserves whichever representation the event already uses.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one day, used for all-day shifts.
pub const MS_PER_DAY: i64 = 86_400_000;

/// The provider's alias for the user's main calendar.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

/// Address of a single event on the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub event_id: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
}

impl EventRef {
    pub fn new(event_id: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        EventRef {
            event_id: event_id.into(),
            calendar_id: calendar_id.into(),
        }
    }

    /// Address an event on the user's main calendar.
    pub fn primary(event_id: impl Into<String>) -> Self {
        Self::new(event_id, DEFAULT_CALENDAR_ID)
    }
}

/// Start or end of an event, preserving the provider representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventTime {
    /// A timed event boundary. `time_zone` is provider metadata carried
    /// through writes unchanged.
    DateTime {
        value: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_zone: Option<String>,
    },
    /// An all-day event boundary (date only, no time of day).
    Date { value: NaiveDate },
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date { .. })
    }

    /// The boundary as an instant, treating all-day dates as UTC midnight.
    /// Only used for duration math between two boundaries of one event.
    pub fn as_instant(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime { value, .. } => *value,
            EventTime::Date { value } => value
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always a valid time")
                .and_utc(),
        }
    }

    /// Shift by a signed millisecond offset, preserving representation.
    ///
    /// All-day boundaries move by whole days only, truncating toward zero:
    /// +26h advances one day, and any offset under 24h leaves the date
    /// unchanged.
    pub fn shifted(&self, delta_ms: i64) -> EventTime {
        match self {
            EventTime::DateTime { value, time_zone } => EventTime::DateTime {
                value: *value + Duration::milliseconds(delta_ms),
                time_zone: time_zone.clone(),
            },
            EventTime::Date { value } => EventTime::Date {
                value: *value + Duration::days(delta_ms / MS_PER_DAY),
            },
        }
    }

    /// Replace the boundary with a new absolute instant, preserving
    /// representation: all-day boundaries keep date-only form.
    pub fn with_instant(&self, instant: DateTime<Utc>) -> EventTime {
        match self {
            EventTime::DateTime { time_zone, .. } => EventTime::DateTime {
                value: instant,
                time_zone: time_zone.clone(),
            },
            EventTime::Date { .. } => EventTime::Date {
                value: instant.date_naive(),
            },
        }
    }
}

/// The start/end pair of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimes {
    pub start: EventTime,
    pub end: EventTime,
}

impl EventTimes {
    /// Event duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.end.as_instant() - self.start.as_instant()).num_milliseconds()
    }

    /// Apply the same signed offset to both boundaries.
    pub fn shifted(&self, delta_ms: i64) -> EventTimes {
        EventTimes {
            start: self.start.shifted(delta_ms),
            end: self.end.shifted(delta_ms),
        }
    }

    /// Move the start to a new absolute instant, keeping the duration and
    /// each boundary's representation.
    pub fn rescheduled(&self, new_start: DateTime<Utc>) -> EventTimes {
        let duration = self.end.as_instant() - self.start.as_instant();
        EventTimes {
            start: self.start.with_instant(new_start),
            end: self.end.with_instant(new_start + duration),
        }
    }
}

/// A calendar visible to the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
}
