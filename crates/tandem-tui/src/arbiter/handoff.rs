// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Interrupts, control handoff and the two-step exit.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{Arbiter, Internal, EXIT_WINDOW_MIN};
use crate::collab::SwitchHandler;
use crate::state::{ConfirmTimer, ControlMode, Screen};

impl Arbiter {
    /// The stop gesture.  Taking control back from the remote side wins over
    /// exiting; otherwise the first interrupt arms the exit confirmation and a
    /// second one inside the window exits.
    pub(super) async fn interrupt(&mut self) {
        if self.mode == ControlMode::Remote {
            if let Some(handler) = self.collab.switch_to_local.clone() {
                self.disarm_exit();
                self.switch_with(ControlMode::Local, handler).await;
                return;
            }
        }

        if matches!(&self.screen, Screen::ConfirmExit(timer) if timer.is_live()) {
            self.exit().await;
        } else {
            self.arm_exit();
        }
    }

    fn arm_exit(&mut self) {
        self.confirm_generation += 1;
        let generation = self.confirm_generation;
        let now = Instant::now();
        let deadline = now.checked_add(self.exit_window).unwrap_or(now + EXIT_WINDOW_MIN);
        let tx = self.internal_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(Internal::ConfirmExpired(generation)).await;
        });
        debug!(generation, window_secs = self.exit_window.as_secs(), "exit confirmation armed");
        // Replacing the screen drops whatever state was there, including an
        // older timer.
        self.screen = Screen::ConfirmExit(ConfirmTimer { deadline, generation, task });
    }

    pub(super) fn disarm_exit(&mut self) {
        if matches!(self.screen, Screen::ConfirmExit(_)) {
            self.screen = Screen::Normal;
            debug!("exit confirmation disarmed");
        }
    }

    pub(super) fn on_confirm_expired(&mut self, generation: u64) {
        let current =
            matches!(&self.screen, Screen::ConfirmExit(timer) if timer.generation == generation);
        if current {
            self.screen = Screen::Normal;
            debug!(generation, "exit confirmation expired");
        } else {
            debug!(generation, "stale exit confirmation expiry ignored");
        }
    }

    /// Run the registered handler for `target`, if any.  Switching to the
    /// side that already holds control does nothing.
    pub(super) async fn handoff(&mut self, target: ControlMode) {
        if self.mode == target {
            debug!(mode = %target, "handoff: already in control");
            return;
        }
        let handler = match target {
            ControlMode::Local => self.collab.switch_to_local.clone(),
            ControlMode::Remote => self.collab.switch_to_remote.clone(),
        };
        let Some(handler) = handler else {
            self.system(format!("Cannot switch to {target}: no handoff available"));
            return;
        };
        self.switch_with(target, handler).await;
    }

    async fn switch_with(&mut self, target: ControlMode, handler: Arc<dyn SwitchHandler>) {
        let from = self.mode;
        match handler.switch().await {
            Ok(()) => {
                self.mode = target;
                // The settings overlay belongs to the terminal.
                if target == ControlMode::Remote && matches!(self.screen, Screen::Settings(_)) {
                    self.screen = Screen::Normal;
                }
                info!(%from, to = %target, "control handed off");
                self.status(format!("Control: {target}"));
            }
            Err(e) => {
                warn!(%from, to = %target, error = %e, "control handoff failed");
                self.system(format!("Failed to switch to {target}: {e:#}"));
            }
        }
    }

    /// Terminal exit.  Pending approvals are cancelled so the agent is not
    /// left waiting, then the exit collaborator runs exactly once.
    pub(super) async fn exit(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;
        self.screen = Screen::Normal;
        let aborted = self.approvals.abort_all();
        if !aborted.is_empty() {
            info!(count = aborted.len(), "pending approvals aborted on exit");
        }
        info!("exiting");
        self.collab.exit.exit().await;
    }
}
