//! Configuration, token, and snapshot storage for the agent.
//!
//! Everything lives under the platform config directory:
//!   ~/.config/calbulk/credentials.json
//!   ~/.config/calbulk/tokens.json
//!   ~/.config/calbulk/selection.json

use crate::types::{Credentials, TokenCache};
use anyhow::{Context, Result};
use calbulk_core::SelectionSnapshot;
use std::path::PathBuf;

fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calbulk"))
}

fn credentials_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("credentials.json"))
}

fn tokens_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("tokens.json"))
}

fn selection_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("selection.json"))
}

pub fn load_credentials() -> Result<Credentials> {
    let path = credentials_path()?;

    if !path.exists() {
        anyhow::bail!(
            "OAuth credentials not found.\n\n\
            Create {} with:\n\n\
            {{\n  \
              \"client_id\": \"your-client-id.apps.googleusercontent.com\",\n  \
              \"client_secret\": \"your-client-secret\"\n\
            }}\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

pub fn load_tokens() -> Result<TokenCache> {
    let path = tokens_path()?;

    if !path.exists() {
        anyhow::bail!("No cached tokens. Sign in first.");
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read tokens from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens from {}", path.display()))
}

pub fn save_tokens(tokens: &TokenCache) -> Result<()> {
    let path = tokens_path()?;
    write_json_file(&path, serde_json::to_string_pretty(tokens)?)
}

/// Remove the cached session. Missing file counts as already signed out.
pub fn delete_tokens() -> Result<()> {
    let path = tokens_path()?;
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove tokens at {}", path.display()))?;
    }
    Ok(())
}

/// Persist the last-known selection snapshot for decoupled UI surfaces.
/// Not authoritative: the engine's store overwrites it on every change.
pub fn save_selection(selection: &SelectionSnapshot) -> Result<()> {
    let path = selection_path()?;
    write_json_file(&path, serde_json::to_string_pretty(selection)?)
}

pub fn load_selection() -> Result<SelectionSnapshot> {
    let path = selection_path()?;
    if !path.exists() {
        return Ok(SelectionSnapshot::new());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read selection from {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse selection from {}", path.display()))
}

/// Truncate the persisted mirror. The authoritative store lives in the
/// engine; this only affects what decoupled surfaces read back, and the
/// engine's own clear path issues the same command to keep both in step.
pub fn clear_selection() -> Result<()> {
    save_selection(&SelectionSnapshot::new())
}

/// Drop succeeded ids from a persisted snapshot after a bulk operation.
/// Failed ids stay listed, matching the engine store, until cleared.
pub fn prune_selection(selection: SelectionSnapshot, succeeded: &[String]) -> SelectionSnapshot {
    selection
        .into_iter()
        .filter(|entry| !succeeded.contains(&entry.event_id))
        .collect()
}

fn write_json_file(path: &PathBuf, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory at {}", parent.display()))?;
    }

    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
