//! Wire types for the Calendar REST API and OAuth token endpoint.

use anyhow::{Context, Result};
use calbulk_core::EventTime;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// OAuth client credentials, read from `credentials.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Cached OAuth session, stored in `tokens.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Token endpoint response for a refresh grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// `start`/`end` object as the API sends and accepts it: exactly one of
/// `date_time` (timed) or `date` (all-day) is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiEventTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ApiEventTime {
    /// Parse the wire form into the shared representation-preserving type.
    pub fn to_event_time(&self) -> Result<EventTime> {
        if let Some(ref date_time) = self.date_time {
            let value = DateTime::parse_from_rfc3339(date_time)
                .with_context(|| format!("Invalid dateTime: {}", date_time))?
                .with_timezone(&Utc);
            return Ok(EventTime::DateTime {
                value,
                time_zone: self.time_zone.clone(),
            });
        }

        if let Some(ref date) = self.date {
            let value = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date: {}", date))?;
            return Ok(EventTime::Date { value });
        }

        anyhow::bail!("Event time has neither dateTime nor date");
    }

    /// Serialize back to the wire form the event originally used.
    pub fn from_event_time(time: &EventTime) -> ApiEventTime {
        match time {
            EventTime::DateTime { value, time_zone } => ApiEventTime {
                date_time: Some(value.to_rfc3339_opts(SecondsFormat::Secs, true)),
                date: None,
                time_zone: time_zone.clone(),
            },
            EventTime::Date { value } => ApiEventTime {
                date_time: None,
                date: Some(value.format("%Y-%m-%d").to_string()),
                time_zone: None,
            },
        }
    }
}

/// The subset of an API event this agent reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    #[serde(default)]
    pub id: String,
    pub start: ApiEventTime,
    pub end: ApiEventTime,
}

#[derive(Debug, Deserialize)]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<CalendarListItem>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarListItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(rename = "backgroundColor", default)]
    pub background_color: Option<String>,
    #[serde(rename = "accessRole", default)]
    pub access_role: Option<String>,
}

/// Error envelope the API wraps non-2xx responses in.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}
