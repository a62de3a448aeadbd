//! Engine-agent protocol types.
//!
//! Defines the JSON protocol spoken between the page-facing engine and the
//! privileged agent binary over stdin/stdout. Strictly request/response:
//! every request yields exactly one response line.

use serde::{Deserialize, Serialize};

/// Commands the agent must implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CheckAuth,
    SignIn,
    SignOut,
    DeleteEvents,
    MoveEvents,
    ShiftEventsByDelta,
    ListCalendars,
    GetEventTime,
    SelectionChanged,
    GetSelection,
    ClearSelection,
    OperationComplete,
}

/// Request sent from the engine to the agent.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from the agent to the engine.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap()
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap()
    }
}

/// Response payload for `CheckAuth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
}
