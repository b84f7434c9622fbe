// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Local prompt input, slash commands and remote commands.

use tracing::{debug, warn};

use super::{Arbiter, RemoteCommand};
use crate::commands::{parse_command, SlashCommand};
use crate::keys::Action;
use crate::state::ControlMode;

impl Arbiter {
    pub(super) async fn prompt_action(&mut self, action: Action) {
        if self.mode != ControlMode::Local {
            debug!(?action, "remote holds control: local input ignored");
            return;
        }
        match action {
            Action::ToggleSettings => self.open_settings(),
            Action::Char(c) => self.editor.insert_char(c),
            Action::Backspace => self.editor.backspace(),
            Action::Delete => self.editor.delete(),
            Action::Left => self.editor.move_left(),
            Action::Right => self.editor.move_right(),
            Action::Home => self.editor.move_home(),
            Action::End => self.editor.move_end(),
            Action::Up => self.editor.history_prev(),
            Action::Down => self.editor.history_next(),
            Action::ClearLine => self.editor.clear(),
            Action::Confirm => self.submit_line().await,
            Action::Escape | Action::Interrupt => {}
        }
    }

    async fn submit_line(&mut self) {
        let line = self.editor.text().trim().to_string();
        if line.is_empty() {
            return;
        }

        if let Some(cmd) = parse_command(&line) {
            self.editor.clear();
            self.run_command(cmd).await;
            return;
        }

        match self.collab.prompts.submit(line.clone()).await {
            Ok(()) => {
                self.editor.push_history(&line);
                self.editor.clear();
            }
            Err(e) => {
                // Keep the text so the user can retry.
                warn!(error = %e, "prompt submission failed");
                self.system(format!("Failed to send prompt: {e:#}"));
            }
        }
    }

    async fn run_command(&mut self, cmd: SlashCommand) {
        debug!(?cmd, "slash command");
        match cmd {
            SlashCommand::Settings => self.open_settings(),
            SlashCommand::Remote => self.handoff(ControlMode::Remote).await,
            SlashCommand::Local => {}
            SlashCommand::Exit => self.exit().await,
            SlashCommand::Decide { decision, id } => {
                let id = id.or_else(|| self.approvals.pending().next().map(|(id, _)| id.to_string()));
                match id {
                    Some(id) => self.decide_approval(&id, decision, ControlMode::Local),
                    None => self.system("No pending approval"),
                }
            }
        }
    }

    pub(super) async fn handle_remote(&mut self, cmd: RemoteCommand) {
        match cmd {
            RemoteCommand::SendPrompt(text) => {
                if self.mode != ControlMode::Remote {
                    debug!("terminal holds control: remote prompt rejected");
                    self.system("Ignored prompt from remote device: the terminal has control");
                    return;
                }
                let text = text.trim().to_string();
                if text.is_empty() {
                    return;
                }
                if let Err(e) = self.collab.prompts.submit(text).await {
                    warn!(error = %e, "remote prompt submission failed");
                    self.system(format!("Failed to send prompt: {e:#}"));
                }
            }
            RemoteCommand::RequestControl => {
                if self.mode == ControlMode::Remote {
                    debug!("remote already holds control");
                    return;
                }
                if self.collab.switch_to_remote.is_none() {
                    self.system("Remote control request refused: no handoff available");
                    return;
                }
                self.handoff(ControlMode::Remote).await;
            }
        }
    }
}
