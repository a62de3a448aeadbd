//! Error types for the calbulk ecosystem.

use thiserror::Error;

/// Errors that can occur when talking to the agent or interpreting the page.
#[derive(Error, Debug)]
pub enum CalbulkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authenticated: {0}")]
    Auth(String),

    #[error("Calendar API error: {0}")]
    Api(String),

    #[error("Operation refused: {0}")]
    Refused(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Agent binary '{0}' not found in PATH")]
    AgentNotInstalled(String),

    #[error("Agent request timed out after {0}s")]
    AgentTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calbulk operations.
pub type CalbulkResult<T> = Result<T, CalbulkError>;
