//! Agent subprocess channel.
//!
//! The engine runs unprivileged next to the host page; the agent binary
//! holds the OAuth session and the calendar API client. This module spawns
//! the agent per request and exchanges one JSON line each way.
//!
//! Notifications sent through [`AgentChannel::notify`] are at-most-once:
//! delivery failures are reported to the caller but carry no guarantee, and
//! the receiving side always re-queries on demand.

use crate::error::{CalbulkError, CalbulkResult};
use crate::protocol::{Command, Request, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as ProcessCommand;
use tokio::time::timeout;

/// Timeout for single-item requests (auth checks, time queries).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for bulk mutations, which may span many sequential chunks.
pub const BULK_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct AgentChannel {
    binary_name: String,
}

impl Default for AgentChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentChannel {
    pub fn new() -> Self {
        AgentChannel {
            binary_name: "calbulk-agent".to_string(),
        }
    }

    /// Use an alternate agent binary name (tests, packaging variants).
    pub fn with_binary(binary_name: impl Into<String>) -> Self {
        AgentChannel {
            binary_name: binary_name.into(),
        }
    }

    fn binary_path(&self) -> CalbulkResult<std::path::PathBuf> {
        which::which(&self.binary_name)
            .map_err(|_| CalbulkError::AgentNotInstalled(self.binary_name.clone()))
    }

    /// Call an agent command with the timeout appropriate for its weight.
    pub async fn call<R: DeserializeOwned>(
        &self,
        command: Command,
        params: serde_json::Value,
    ) -> CalbulkResult<R> {
        let deadline = match command {
            Command::DeleteEvents | Command::MoveEvents | Command::ShiftEventsByDelta => {
                BULK_TIMEOUT
            }
            _ => REQUEST_TIMEOUT,
        };
        timeout(deadline, self.call_inner(command, params))
            .await
            .map_err(|_| CalbulkError::AgentTimeout(deadline.as_secs()))?
    }

    /// Fire a best-effort notification: a failed send is surfaced but the
    /// caller is expected to ignore it.
    pub async fn notify(&self, command: Command, params: serde_json::Value) -> CalbulkResult<()> {
        self.call::<serde_json::Value>(command, params).await?;
        Ok(())
    }

    async fn call_inner<R: DeserializeOwned>(
        &self,
        command: Command,
        params: serde_json::Value,
    ) -> CalbulkResult<R> {
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalbulkError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = ProcessCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()
            .map_err(|e| {
                CalbulkError::Agent(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        // Write request to stdin (unwrap safe: we piped stdin above)
        let mut stdin = child.stdin.take().unwrap();
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalbulkError::Agent(format!(
                "Agent exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(CalbulkError::Agent("Agent returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(response_str.trim())
            .map_err(|e| CalbulkError::Agent(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(CalbulkError::Api(error)),
        }
    }
}
