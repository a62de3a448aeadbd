//! calbulk-agent - privileged calendar mutation agent.
//!
//! This binary is the privileged half of calbulk: it owns the OAuth
//! session and the calendar API client, and serves the engine over JSON
//! lines on stdin/stdout. Every request line yields exactly one response
//! line; logging goes to stderr so stdout stays protocol-clean.
//!
//! State lives under ~/.config/calbulk/ (credentials, token cache, and the
//! last-known selection snapshot for decoupled UI surfaces).

use calbulk_agent::api::CalendarApi;
use calbulk_agent::{auth, batch, config};
use calbulk_core::protocol::{AuthStatus, Command, Request, Response};
use calbulk_core::{
    EventRef, EventTimeParams, EventTimePayload, MoveParams, OperationCompleteParams,
    SelectionChangedParams, ShiftParams,
};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = Response::error(&format!("Failed to parse request: {}", e));
                writeln!(stdout, "{}", response).unwrap();
                stdout.flush().unwrap();
                continue;
            }
        };

        let response = handle_request(request).await;

        writeln!(stdout, "{}", response).unwrap();
        stdout.flush().unwrap();
    }
}

async fn handle_request(request: Request) -> String {
    match request.command {
        Command::CheckAuth => handle_check_auth(),
        Command::SignIn => handle_sign_in().await,
        Command::SignOut => handle_sign_out(),
        Command::DeleteEvents => handle_delete_events(&request.params).await,
        Command::MoveEvents => handle_move_events(&request.params).await,
        Command::ShiftEventsByDelta => handle_shift_events(&request.params).await,
        Command::ListCalendars => handle_list_calendars().await,
        Command::GetEventTime => handle_get_event_time(&request.params).await,
        Command::SelectionChanged => handle_selection_changed(&request.params),
        Command::GetSelection => handle_get_selection(),
        Command::ClearSelection => handle_clear_selection(),
        Command::OperationComplete => handle_operation_complete(&request.params),
    }
}

/// Build an API client from the cached session, refreshing if stale.
async fn authenticated_api() -> anyhow::Result<CalendarApi> {
    let token = auth::get_valid_access_token().await?;
    CalendarApi::new(token)
}

fn handle_check_auth() -> String {
    Response::success(AuthStatus {
        authenticated: auth::is_authenticated(),
    })
}

async fn handle_sign_in() -> String {
    match auth::sign_in().await {
        Ok(()) => {
            info!("session established");
            Response::success(())
        }
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_sign_out() -> String {
    match auth::sign_out() {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteEventsParams {
    events: Vec<EventRef>,
}

async fn handle_delete_events(params: &serde_json::Value) -> String {
    let params: DeleteEventsParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let api = match authenticated_api().await {
        Ok(api) => api,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    info!(count = params.events.len(), "deleting events");
    let outcome = batch::run_batch(&params.events, |ev| api.delete_event(ev)).await;
    Response::success(outcome)
}

async fn handle_move_events(params: &serde_json::Value) -> String {
    let params: MoveParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    if params.target_calendar_id.is_none() && params.new_start.is_none() {
        return Response::error("Move requires a target calendar or a new start time");
    }

    let api = match authenticated_api().await {
        Ok(api) => api,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    info!(count = params.events.len(), "moving events");
    let target = params.target_calendar_id.as_deref();
    let new_start = params.new_start;
    let outcome =
        batch::run_batch(&params.events, |ev| api.move_event(ev, target, new_start)).await;
    Response::success(outcome)
}

async fn handle_shift_events(params: &serde_json::Value) -> String {
    let params: ShiftParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let api = match authenticated_api().await {
        Ok(api) => api,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    info!(
        count = params.events.len(),
        delta_ms = params.delta_ms,
        "shifting events"
    );
    let delta_ms = params.delta_ms;
    let outcome = batch::run_batch(&params.events, |ev| api.shift_event(ev, delta_ms)).await;
    Response::success(outcome)
}

async fn handle_list_calendars() -> String {
    let api = match authenticated_api().await {
        Ok(api) => api,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match api.list_calendars().await {
        Ok(calendars) => Response::success(calendars),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

async fn handle_get_event_time(params: &serde_json::Value) -> String {
    let params: EventTimeParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let api = match authenticated_api().await {
        Ok(api) => api,
        Err(e) => return Response::error(&format!("{:#}", e)),
    };

    match api.get_event_time(&params.event).await {
        Ok(times) => Response::success(EventTimePayload {
            start: times.start,
            end: times.end,
        }),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_selection_changed(params: &serde_json::Value) -> String {
    let params: SelectionChangedParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match config::save_selection(&params.selection) {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_get_selection() -> String {
    match config::load_selection() {
        Ok(selection) => Response::success(selection),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

fn handle_clear_selection() -> String {
    match config::clear_selection() {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

/// A bulk operation finished: prune its succeeded ids from the persisted
/// snapshot so decoupled UI surfaces converge on the post-operation state.
fn handle_operation_complete(params: &serde_json::Value) -> String {
    let params: OperationCompleteParams = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let result = config::load_selection()
        .map(|selection| config::prune_selection(selection, &params.succeeded))
        .and_then(|pruned| config::save_selection(&pruned));

    match result {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
