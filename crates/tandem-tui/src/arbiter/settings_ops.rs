// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Settings overlay: menu, pickers, free-text edits and the commit.

use tandem_config::PermissionMode;
use tracing::{info, warn};

use super::{Arbiter, Internal};
use crate::keys::Action;
use crate::settings::options::build_options;
use crate::settings::{RunSettings, SettingsDraft, SettingsRow};
use crate::state::{FreeTextEdit, OverlayFocus, Picker, Screen, SettingsOverlay};

/// What an action does to the overlay as a whole.
enum Transition {
    Stay,
    Focus(OverlayFocus),
    Close,
    Commit,
}

impl Arbiter {
    pub(super) fn open_settings(&mut self) {
        if matches!(self.screen, Screen::Normal) {
            self.screen = Screen::Settings(SettingsOverlay::open(&self.committed));
        }
    }

    pub(super) fn settings_action(&mut self, action: Action) {
        let Screen::Settings(overlay) = &mut self.screen else {
            return;
        };
        let transition = match &mut overlay.focus {
            OverlayFocus::Menu => {
                menu_action(&mut overlay.cursor, &mut overlay.draft, &self.hints, action)
            }
            OverlayFocus::Picker(picker) => picker_action(picker, &mut overlay.draft, action),
            OverlayFocus::Editing(edit) => edit_action(edit, &mut overlay.draft, action),
        };

        match transition {
            Transition::Stay => {}
            Transition::Focus(focus) => overlay.focus = focus,
            Transition::Close => self.screen = Screen::Normal,
            Transition::Commit => self.start_commit(),
        }
    }

    /// Move to `ActionInProgress` and hand the normalized draft to the
    /// committer on a separate task.
    fn start_commit(&mut self) {
        let screen = std::mem::replace(&mut self.screen, Screen::Normal);
        let Screen::Settings(overlay) = screen else {
            self.screen = screen;
            return;
        };
        let settings = overlay.draft.normalize();
        info!(settings = %settings.summary(), "committing settings");
        self.screen = Screen::ActionInProgress(overlay);

        let committer = self.collab.settings.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = committer
                .commit(settings.clone())
                .await
                .map(|()| settings)
                .map_err(|e| format!("{e:#}"));
            let _ = tx.send(Internal::CommitFinished(result)).await;
        });
    }

    pub(super) fn on_commit_finished(&mut self, result: Result<RunSettings, String>) {
        let screen = std::mem::replace(&mut self.screen, Screen::Normal);
        let Screen::ActionInProgress(overlay) = screen else {
            warn!("settings commit finished with no commit in progress");
            self.screen = screen;
            return;
        };
        match result {
            Ok(settings) => {
                info!(settings = %settings.summary(), "settings saved");
                self.system(format!("Settings saved: {}", settings.summary()));
                self.committed = settings;
            }
            Err(reason) => {
                warn!(%reason, "settings commit failed");
                self.system(format!("Failed to save settings: {reason}"));
                self.screen = Screen::Settings(overlay);
            }
        }
    }
}

fn menu_action(
    cursor: &mut SettingsRow,
    draft: &mut SettingsDraft,
    hints: &tandem_config::OptionHints,
    action: Action,
) -> Transition {
    match action {
        Action::Up => *cursor = cursor.prev(),
        Action::Down => *cursor = cursor.next(),
        Action::Char(c) => {
            if let Some(mode) = c.to_digit(10).and_then(PermissionMode::from_shortcut) {
                draft.permission_mode = mode;
            }
        }
        Action::Escape | Action::ToggleSettings => return Transition::Close,
        Action::Confirm => match *cursor {
            SettingsRow::PermissionMode => draft.permission_mode = draft.permission_mode.next(),
            SettingsRow::Save => return Transition::Commit,
            SettingsRow::Cancel => return Transition::Close,
            row => {
                if let Some(field) = row.picker_field() {
                    let current = draft.get(field);
                    let options = build_options(field, hints, current);
                    let picker = Picker::new(field, options, current);
                    return Transition::Focus(OverlayFocus::Picker(picker));
                }
            }
        },
        _ => {}
    }
    Transition::Stay
}

fn picker_action(picker: &mut Picker, draft: &mut SettingsDraft, action: Action) -> Transition {
    match action {
        Action::Up => picker.select_prev(),
        Action::Down => picker.select_next(),
        Action::Escape => return Transition::Focus(OverlayFocus::Menu),
        Action::ToggleSettings => return Transition::Close,
        Action::Confirm => {
            let Some(choice) = picker.selected_option() else {
                return Transition::Stay;
            };
            if choice.is_custom() {
                let text = draft.get(picker.field).to_string();
                return Transition::Focus(OverlayFocus::Editing(FreeTextEdit {
                    field: picker.field,
                    text,
                }));
            }
            draft.set(picker.field, choice.value.clone());
            return Transition::Focus(OverlayFocus::Menu);
        }
        _ => {}
    }
    Transition::Stay
}

/// Free-text entry.  Only Enter and Escape leave it; the toggle key is
/// ignored here so it cannot throw away a half-typed value.
fn edit_action(edit: &mut FreeTextEdit, draft: &mut SettingsDraft, action: Action) -> Transition {
    match action {
        Action::Char(c) => edit.text.push(c),
        Action::Backspace => {
            edit.text.pop();
        }
        Action::ClearLine => edit.text.clear(),
        Action::Confirm => {
            draft.set(edit.field, edit.text.trim());
            return Transition::Focus(OverlayFocus::Menu);
        }
        Action::Escape => return Transition::Focus(OverlayFocus::Menu),
        _ => {}
    }
    Transition::Stay
}
