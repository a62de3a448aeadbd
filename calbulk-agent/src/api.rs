//! Remote mutation client for the Calendar REST API (v3 surface).
//!
//! Failure normalization: any non-2xx response becomes an error carrying
//! the provider's own message when the body parses as the standard error
//! envelope, falling back to the HTTP status. 204/empty bodies are success.
//! No retries happen here; each item gets one bounded attempt.

use crate::types::{ApiErrorBody, ApiEvent, ApiEventTime, CalendarListResponse};
use anyhow::{Context, Result};
use calbulk_core::{Calendar, EventRef, EventTimes};
use chrono::{DateTime, Utc};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// One bounded attempt per request; retry policy is the caller's business.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct PatchTimesBody {
    start: ApiEventTime,
    end: ApiEventTime,
}

pub struct CalendarApi {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl CalendarApi {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(access_token, API_BASE)
    }

    /// Point the client at an alternate base URL (used by tests).
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(CalendarApi {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn event_path(event: &EventRef) -> String {
        format!(
            "/calendars/{}/events/{}",
            urlencoding::encode(&event.calendar_id),
            urlencoding::encode(&event.event_id)
        )
    }

    async fn execute(&self, method: Method, path: &str, body: Option<&impl Serialize>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %path, "calendar API request");

        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        builder.send().await.context("Request failed")
    }

    /// Turn a non-2xx response into the normalized error.
    async fn api_error(response: Response) -> anyhow::Error {
        let status = response.status();
        let fallback = format!("API error: {}", status);

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) if !parsed.error.message.is_empty() => {
                    anyhow::anyhow!(parsed.error.message)
                }
                _ => anyhow::anyhow!(fallback),
            },
            Err(_) => anyhow::anyhow!(fallback),
        }
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        response.json().await.context("Malformed response body")
    }

    async fn expect_ok(response: Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    pub async fn get_event(&self, event: &EventRef) -> Result<ApiEvent> {
        let response = self
            .execute(Method::GET, &Self::event_path(event), None::<&()>)
            .await?;
        Self::expect_json(response).await
    }

    /// Current start/end of an event.
    pub async fn get_event_time(&self, event: &EventRef) -> Result<EventTimes> {
        let current = self.get_event(event).await?;
        Ok(EventTimes {
            start: current.start.to_event_time()?,
            end: current.end.to_event_time()?,
        })
    }

    /// Delete one event. A 410/Gone means it is already deleted, which is
    /// success for our purposes.
    pub async fn delete_event(&self, event: &EventRef) -> Result<()> {
        let response = self
            .execute(Method::DELETE, &Self::event_path(event), None::<&()>)
            .await?;

        if response.status() == StatusCode::GONE {
            return Ok(());
        }
        Self::expect_ok(response).await
    }

    /// Relocate an event to another calendar and/or reschedule it to a new
    /// absolute start. At least one of the two must be supplied.
    pub async fn move_event(
        &self,
        event: &EventRef,
        target_calendar_id: Option<&str>,
        new_start: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut effective = event.clone();

        if let Some(target) = target_calendar_id
            && target != event.calendar_id
        {
            let path = format!(
                "{}/move?destination={}",
                Self::event_path(event),
                urlencoding::encode(target)
            );
            let response = self.execute(Method::POST, &path, None::<&()>).await?;
            Self::expect_ok(response).await?;
            effective.calendar_id = target.to_string();
        }

        if let Some(new_start) = new_start {
            let times = self.get_event_time(&effective).await?;
            self.patch_times(&effective, &times.rescheduled(new_start))
                .await?;
        }

        Ok(())
    }

    /// Shift both boundaries of an event by a signed millisecond offset.
    pub async fn shift_event(&self, event: &EventRef, delta_ms: i64) -> Result<()> {
        let times = self.get_event_time(event).await?;
        self.patch_times(event, &times.shifted(delta_ms)).await
    }

    async fn patch_times(&self, event: &EventRef, times: &EventTimes) -> Result<()> {
        let body = PatchTimesBody {
            start: ApiEventTime::from_event_time(&times.start),
            end: ApiEventTime::from_event_time(&times.end),
        };
        let response = self
            .execute(Method::PATCH, &Self::event_path(event), Some(&body))
            .await?;
        Self::expect_ok(response).await
    }

    /// Every calendar the authenticated identity can see, normalized.
    pub async fn list_calendars(&self) -> Result<Vec<Calendar>> {
        let response = self
            .execute(Method::GET, "/users/me/calendarList", None::<&()>)
            .await?;
        let list: CalendarListResponse = Self::expect_json(response).await?;

        Ok(list
            .items
            .into_iter()
            .filter(|c| !c.id.is_empty())
            .map(|c| Calendar {
                id: c.id,
                summary: if c.summary.is_empty() {
                    "(unnamed)".to_string()
                } else {
                    c.summary
                },
                primary: c.primary,
                background_color: c.background_color,
                access_role: c.access_role,
            })
            .collect())
    }
}
