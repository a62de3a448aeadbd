//! HTTP-level tests for the remote mutation client and batch fan-out,
//! against a mock calendar API.

use calbulk_agent::api::CalendarApi;
use calbulk_agent::batch::run_batch;
use calbulk_core::{BulkOutcome, EventRef};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use serde_json::json;

fn timed_event_body(start: &str, end: &str, tz: &str) -> serde_json::Value {
    json!({
        "id": "e1",
        "start": { "dateTime": start, "timeZone": tz },
        "end": { "dateTime": end, "timeZone": tz },
    })
}

#[tokio::test]
async fn delete_treats_204_and_410_as_success_and_extracts_error_messages() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/ok"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_json(json!({
            "error": { "message": "Resource has been deleted" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "not found" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/opaque"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();

    api.delete_event(&EventRef::primary("ok")).await.unwrap();
    // Already deleted on the remote side counts as success.
    api.delete_event(&EventRef::primary("gone")).await.unwrap();

    let err = api
        .delete_event(&EventRef::primary("missing"))
        .await
        .unwrap_err();
    assert_eq!(format!("{}", err), "not found");

    // Malformed body falls back to the status line, no panic.
    let err = api
        .delete_event(&EventRef::primary("opaque"))
        .await
        .unwrap_err();
    assert!(format!("{}", err).contains("500"));
}

#[tokio::test]
async fn batch_accounting_is_total_and_exclusive() {
    let server = MockServer::start().await;

    for id in ["e1", "e2"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/calendars/primary/events/{id}")))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/e3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "not found" }
        })))
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    let events: Vec<EventRef> = ["e1", "e2", "e3"]
        .into_iter()
        .map(EventRef::primary)
        .collect();

    let outcome: BulkOutcome = run_batch(&events, |ev| api.delete_event(ev)).await;

    assert!(outcome.accounts_for(events.iter().map(|e| e.event_id.as_str())));
    assert_eq!(outcome.succeeded, vec!["e1", "e2"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].event_id, "e3");
    assert_eq!(outcome.failed[0].error, "not found");
}

#[tokio::test]
async fn shift_patches_both_boundaries_preserving_time_zone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timed_event_body(
            "2024-05-01T09:00:00Z",
            "2024-05-01T10:30:00Z",
            "Europe/Stockholm",
        )))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendars/primary/events/e1"))
        .and(body_partial_json(json!({
            "start": { "dateTime": "2024-05-01T10:00:00Z", "timeZone": "Europe/Stockholm" },
            "end": { "dateTime": "2024-05-01T11:30:00Z", "timeZone": "Europe/Stockholm" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    api.shift_event(&EventRef::primary("e1"), 60 * 60 * 1000)
        .await
        .unwrap();
}

#[tokio::test]
async fn shift_keeps_all_day_events_date_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/allday"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "allday",
            "start": { "date": "2024-05-01" },
            "end": { "date": "2024-05-02" },
        })))
        .mount(&server)
        .await;
    // +26h advances exactly one day and must stay date-only.
    Mock::given(method("PATCH"))
        .and(path("/calendars/primary/events/allday"))
        .and(body_partial_json(json!({
            "start": { "date": "2024-05-02" },
            "end": { "date": "2024-05-03" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    api.shift_event(&EventRef::primary("allday"), 26 * 60 * 60 * 1000)
        .await
        .unwrap();
}

#[tokio::test]
async fn move_relocates_then_reschedules_preserving_duration() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/calendars/work/events/e1/move"))
        .and(query_param("destination", "home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    // After the relocation the event is read from the target calendar.
    Mock::given(method("GET"))
        .and(path("/calendars/home/events/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timed_event_body(
            "2024-05-01T09:00:00Z",
            "2024-05-01T10:30:00Z",
            "UTC",
        )))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendars/home/events/e1"))
        .and(body_partial_json(json!({
            "start": { "dateTime": "2024-06-10T14:00:00Z" },
            "end": { "dateTime": "2024-06-10T15:30:00Z" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    let new_start = "2024-06-10T14:00:00Z".parse().unwrap();
    api.move_event(&EventRef::new("e1", "work"), Some("home"), Some(new_start))
        .await
        .unwrap();
}

#[tokio::test]
async fn move_skips_relocation_when_target_matches_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/work/events/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timed_event_body(
            "2024-05-01T09:00:00Z",
            "2024-05-01T10:00:00Z",
            "UTC",
        )))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendars/work/events/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    let new_start = "2024-05-02T09:00:00Z".parse().unwrap();
    api.move_event(&EventRef::new("e1", "work"), Some("work"), Some(new_start))
        .await
        .unwrap();

    // No POST /move must have been issued.
    let moves = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(moves, 0);
}

#[tokio::test]
async fn list_calendars_normalizes_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "alice@example.com",
                    "summary": "Alice",
                    "primary": true,
                    "backgroundColor": "#9fe1e7",
                    "accessRole": "owner"
                },
                { "id": "team@example.com" },
                { "id": "", "summary": "ghost" }
            ]
        })))
        .mount(&server)
        .await;

    let api = CalendarApi::with_base_url("token", server.uri()).unwrap();
    let calendars = api.list_calendars().await.unwrap();

    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].id, "alice@example.com");
    assert!(calendars[0].primary);
    assert_eq!(calendars[0].background_color.as_deref(), Some("#9fe1e7"));
    assert_eq!(calendars[0].access_role.as_deref(), Some("owner"));
    assert_eq!(calendars[1].summary, "(unnamed)");
    assert!(!calendars[1].primary);
}
