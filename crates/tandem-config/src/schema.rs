// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown permission mode {0:?} (expected default | read-only | safe-yolo | yolo)")]
    UnknownPermissionMode(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tui: TuiConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_buffer_capacity() -> usize {
    1000
}
fn default_exit_confirm_secs() -> u64 {
    15
}
fn default_history_limit() -> usize {
    50
}
fn default_agent_config_path() -> String {
    "~/.codex/config.toml".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of session events kept for replay to late subscribers.
    /// The oldest events are evicted first.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { buffer_capacity: default_buffer_capacity() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Seconds the "press Ctrl+C again to exit" confirmation stays armed.
    #[serde(default = "default_exit_confirm_secs")]
    pub exit_confirm_secs: u64,
    /// Number of submitted prompts remembered for Up/Down recall.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            exit_confirm_secs: default_exit_confirm_secs(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The agent's own TOML config.  Only read for picker hints (default
    /// model, reasoning effort, profile names); never written.
    #[serde(default = "default_agent_config_path")]
    pub config_path: String,
    /// Permission posture committed at startup.
    #[serde(default)]
    pub default_permission_mode: PermissionMode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            config_path: default_agent_config_path(),
            default_permission_mode: PermissionMode::default(),
        }
    }
}

impl AgentConfig {
    /// `config_path` with `~` and environment variables expanded.
    pub fn resolved_config_path(&self) -> PathBuf {
        match shellexpand::full(&self.config_path) {
            Ok(p) => PathBuf::from(p.into_owned()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.config_path).into_owned()),
        }
    }
}

/// How much the agent may do without asking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionMode {
    /// Ask before risky commands and edits
    #[default]
    Default,
    /// No writes, no commands with side effects
    ReadOnly,
    /// Auto-approve inside the sandbox
    SafeYolo,
    /// Approve everything
    Yolo,
}

impl PermissionMode {
    /// All modes in cycle order; index + 1 is the overlay's numeric shortcut.
    pub const ALL: [PermissionMode; 4] = [
        PermissionMode::Default,
        PermissionMode::ReadOnly,
        PermissionMode::SafeYolo,
        PermissionMode::Yolo,
    ];

    /// Cycle: default → read-only → safe-yolo → yolo → default.
    pub fn next(self) -> Self {
        match self {
            PermissionMode::Default => PermissionMode::ReadOnly,
            PermissionMode::ReadOnly => PermissionMode::SafeYolo,
            PermissionMode::SafeYolo => PermissionMode::Yolo,
            PermissionMode::Yolo => PermissionMode::Default,
        }
    }

    /// Mode bound to the digit shortcut `n` (1-based).
    pub fn from_shortcut(n: u32) -> Option<Self> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        Self::ALL.get(idx).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::ReadOnly => "read-only",
            PermissionMode::SafeYolo => "safe-yolo",
            PermissionMode::Yolo => "yolo",
        }
    }
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownPermissionMode(s.to_string()))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
