// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Run settings and the editable draft the overlay works on.
//!
//! The overlay never touches [`RunSettings`] directly.  It edits a
//! [`SettingsDraft`] (plain strings, empty meaning "use the default"), and only
//! a successful commit turns the normalized draft into the new settings.

pub mod options;

use std::fmt;

use serde::{Deserialize, Serialize};
use tandem_config::PermissionMode;

/// Settings the agent runs with.  `None` means "let the agent pick".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSettings {
    pub permission_mode: PermissionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
}

impl RunSettings {
    pub fn with_permission_mode(permission_mode: PermissionMode) -> Self {
        Self { permission_mode, ..Self::default() }
    }

    /// One-line summary, e.g. for the "saved" event.
    pub fn summary(&self) -> String {
        fn or_default(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("default")
        }
        format!(
            "permission={}, model={}, effort={}, profile={}",
            self.permission_mode,
            or_default(&self.model),
            or_default(&self.reasoning_effort),
            or_default(&self.profile),
        )
    }
}

/// The string-valued fields that get a picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerField {
    Model,
    ReasoningEffort,
    Profile,
}

impl PickerField {
    pub fn label(self) -> &'static str {
        match self {
            PickerField::Model => "Model",
            PickerField::ReasoningEffort => "Reasoning effort",
            PickerField::Profile => "Profile",
        }
    }
}

impl fmt::Display for PickerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rows of the settings overlay, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsRow {
    #[default]
    PermissionMode,
    Model,
    ReasoningEffort,
    Profile,
    Save,
    Cancel,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 6] = [
        SettingsRow::PermissionMode,
        SettingsRow::Model,
        SettingsRow::ReasoningEffort,
        SettingsRow::Profile,
        SettingsRow::Save,
        SettingsRow::Cancel,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    /// Next row, wrapping from the last to the first.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The picker this row opens, if any.
    pub fn picker_field(self) -> Option<PickerField> {
        match self {
            SettingsRow::Model => Some(PickerField::Model),
            SettingsRow::ReasoningEffort => Some(PickerField::ReasoningEffort),
            SettingsRow::Profile => Some(PickerField::Profile),
            _ => None,
        }
    }
}

/// Uncommitted edits.  Empty strings stand for "default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDraft {
    pub permission_mode: PermissionMode,
    pub model: String,
    pub profile: String,
    pub reasoning_effort: String,
}

impl SettingsDraft {
    /// Seed a draft from the committed settings; unset fields become empty.
    pub fn from_settings(settings: &RunSettings) -> Self {
        Self {
            permission_mode: settings.permission_mode,
            model: settings.model.clone().unwrap_or_default(),
            profile: settings.profile.clone().unwrap_or_default(),
            reasoning_effort: settings.reasoning_effort.clone().unwrap_or_default(),
        }
    }

    pub fn get(&self, field: PickerField) -> &str {
        match field {
            PickerField::Model => &self.model,
            PickerField::ReasoningEffort => &self.reasoning_effort,
            PickerField::Profile => &self.profile,
        }
    }

    pub fn set(&mut self, field: PickerField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PickerField::Model => self.model = value,
            PickerField::ReasoningEffort => self.reasoning_effort = value,
            PickerField::Profile => self.profile = value,
        }
    }

    /// Trim every string field; blank becomes `None`.  The permission mode is
    /// always set and passes through unchanged.
    pub fn normalize(&self) -> RunSettings {
        fn opt(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        RunSettings {
            permission_mode: self.permission_mode,
            model: opt(&self.model),
            profile: opt(&self.profile),
            reasoning_effort: opt(&self.reasoning_effort),
        }
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
