//! Engine configuration.
//!
//! Loaded from ~/.config/calbulk/engine.toml when present; every field has
//! a default so the file is optional. Matcher rules live here so new host
//! markup patterns are a config edit, not a code change.

use crate::matcher::{self, MatcherRule};
use calbulk_core::{CalbulkError, CalbulkResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Calendar assumed for events whose element names none, before
    /// falling back to "primary".
    pub default_calendar_id: Option<String>,
    /// Prioritized event-element matchers.
    pub matchers: Vec<MatcherRule>,
    /// Drag offsets below this are treated as jitter.
    pub min_shift_minutes: i64,
    /// How long to wait after drag-end for the host to finish its own
    /// mutation before reading the moved event back.
    pub settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_calendar_id: None,
            matchers: matcher::default_rules(),
            min_shift_minutes: 5,
            settle_ms: 300,
        }
    }
}

impl EngineConfig {
    pub fn min_shift_delta_ms(&self) -> i64 {
        self.min_shift_minutes * 60 * 1000
    }

    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_ms)
    }

    /// Load from the config directory, defaulting when no file exists.
    pub fn load() -> CalbulkResult<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from(path: &PathBuf) -> CalbulkResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            CalbulkError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

fn config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("calbulk").join("engine.toml"))
}
