// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Arbiter state.
//!
//! The sub-states are mutually exclusive, so they are one enum rather than a
//! set of flags: an overlay cannot be open while an exit confirmation is
//! armed, and a picker only exists inside an overlay.  Everything a state
//! needs (the confirmation timer, the draft, the picker list) lives in its
//! variant and is dropped when the state is left.

use std::fmt;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::settings::options::{initial_selection, PickerOption};
use crate::settings::{PickerField, RunSettings, SettingsDraft, SettingsRow};

/// Which side currently supplies input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlMode::Local => "local",
            ControlMode::Remote => "remote",
        })
    }
}

/// Sub-state tag, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubState {
    Normal,
    Confirmation,
    SettingsOverlay,
    SettingsPicker,
    /// Free-text entry reached through the picker's custom option.
    SettingsEditing,
    ActionInProgress,
}

// ── Internal state ────────────────────────────────────────────────────────────

pub(crate) enum Screen {
    Normal,
    ConfirmExit(ConfirmTimer),
    Settings(SettingsOverlay),
    /// A settings commit is running.  The overlay is kept so a failed commit
    /// can put the user back exactly where they were.
    ActionInProgress(SettingsOverlay),
}

impl Screen {
    pub(crate) fn sub_state(&self) -> SubState {
        match self {
            Screen::Normal => SubState::Normal,
            Screen::ConfirmExit(_) => SubState::Confirmation,
            Screen::Settings(o) => match o.focus {
                OverlayFocus::Menu => SubState::SettingsOverlay,
                OverlayFocus::Picker(_) => SubState::SettingsPicker,
                OverlayFocus::Editing(_) => SubState::SettingsEditing,
            },
            Screen::ActionInProgress(_) => SubState::ActionInProgress,
        }
    }
}

/// An armed exit confirmation.  Dropping it cancels the expiry task, so
/// leaving the confirmation state by any path stops the timer.
pub(crate) struct ConfirmTimer {
    pub deadline: Instant,
    pub generation: u64,
    pub task: JoinHandle<()>,
}

impl ConfirmTimer {
    pub fn is_live(&self) -> bool {
        Instant::now() < self.deadline
    }
}

impl Drop for ConfirmTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) struct SettingsOverlay {
    pub draft: SettingsDraft,
    pub cursor: SettingsRow,
    pub focus: OverlayFocus,
}

impl SettingsOverlay {
    pub fn open(committed: &RunSettings) -> Self {
        Self {
            draft: SettingsDraft::from_settings(committed),
            cursor: SettingsRow::default(),
            focus: OverlayFocus::Menu,
        }
    }
}

pub(crate) enum OverlayFocus {
    Menu,
    Picker(Picker),
    Editing(FreeTextEdit),
}

pub(crate) struct Picker {
    pub field: PickerField,
    pub options: Vec<PickerOption>,
    pub selected: usize,
}

impl Picker {
    pub fn new(field: PickerField, options: Vec<PickerOption>, current: &str) -> Self {
        let selected = initial_selection(&options, current);
        Self { field, options, selected }
    }

    pub fn select_next(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.options.is_empty() {
            let n = self.options.len();
            self.selected = (self.selected + n - 1) % n;
        }
    }

    pub fn selected_option(&self) -> Option<&PickerOption> {
        self.options.get(self.selected)
    }
}

pub(crate) struct FreeTextEdit {
    pub field: PickerField,
    pub text: String,
}

// ── Presentation snapshot ─────────────────────────────────────────────────────

/// What a renderer may see of the arbiter.  A copy, so it cannot be used to
/// change anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbiterView {
    pub mode: ControlMode,
    pub sub_state: SubState,
    pub committed: RunSettings,
    pub exit_armed: bool,
    pub prompt: String,
    pub prompt_cursor: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsView>,
    pub pending_approvals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsView {
    pub cursor: SettingsRow,
    pub draft: SettingsDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picker: Option<PickerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerView {
    pub field: PickerField,
    pub options: Vec<PickerOption>,
    pub selected: usize,
}

impl From<&SettingsOverlay> for SettingsView {
    fn from(o: &SettingsOverlay) -> Self {
        let (picker, editing) = match &o.focus {
            OverlayFocus::Menu => (None, None),
            OverlayFocus::Picker(p) => (
                Some(PickerView { field: p.field, options: p.options.clone(), selected: p.selected }),
                None,
            ),
            OverlayFocus::Editing(e) => (None, Some(e.text.clone())),
        };
        Self {
            cursor: o.cursor,
            draft: o.draft.clone(),
            picker,
            editing,
        }
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
