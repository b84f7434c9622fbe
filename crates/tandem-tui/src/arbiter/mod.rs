// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//!
//! `Arbiter`: decides who is typing and what their input means.
//!
//! # Design
//!
//! ```text
//!   crossterm keys ──┐
//!   remote device ───┼──► mpsc::Sender<Input> ──► Arbiter ──► MessageBuffer ──► observers
//!   agent approvals ─┘                              │  ▲
//!                                                   │  │
//!   confirm timer / settings commit ──► internal_tx ┘  │
//!                                                      └── collaborators (prompt sink,
//!                                                          committer, switch, exit)
//! ```
//!
//! Inputs are processed **one at a time**; the arbiter never runs two
//! transitions concurrently.  Work that takes a while (the settings commit)
//! runs on a spawned task and reports back on the internal channel, and the
//! arbiter stays in `ActionInProgress` until it does.
//!
//! # Usage
//!
//! ```rust,ignore
//! let (arbiter, handle) = Arbiter::new(ArbiterOptions::new(buffer, hints), collaborators);
//! tokio::spawn(arbiter.run());
//! handle.send(Input::Remote(RemoteCommand::RequestControl)).await?;
//! ```

mod approvals;
mod handoff;
mod prompt;
mod settings_ops;

use std::time::Duration;

use crossterm::event::KeyEvent;
use tandem_approval::{ApprovalDecision, ApprovalRelay, ApprovalReply, ApprovalRequest};
use tandem_config::{Config, OptionHints};
use tandem_session::{EventKind, MessageBuffer, SessionEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::collab::Collaborators;
use crate::editor::PromptEditor;
use crate::keys::{map_key, Action};
use crate::settings::RunSettings;
use crate::state::{ArbiterView, ControlMode, Screen, SettingsView, SubState};

/// Commands from the remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Send a prompt to the agent.  Only honoured while remote holds control.
    SendPrompt(String),
    /// Ask to take control from the terminal.
    RequestControl,
}

#[derive(Debug)]
pub enum Input {
    /// Raw terminal key.
    Key(KeyEvent),
    /// Already-mapped local action.
    Action(Action),
    Remote(RemoteCommand),
    /// The agent wants a decision; the reply goes back on `reply`.
    ApprovalRequested {
        request: ApprovalRequest,
        reply: oneshot::Sender<ApprovalReply>,
    },
    ApprovalDecided {
        id: String,
        decision: ApprovalDecision,
        origin: ControlMode,
    },
}

/// Completions from tasks the arbiter spawned.
#[derive(Debug)]
enum Internal {
    ConfirmExpired(u64),
    CommitFinished(Result<RunSettings, String>),
}

/// Cheap-to-clone handle for feeding the arbiter.
#[derive(Clone)]
pub struct InputHandle {
    tx: mpsc::Sender<Input>,
}

impl InputHandle {
    pub async fn send(&self, input: Input) -> anyhow::Result<()> {
        self.tx
            .send(input)
            .await
            .map_err(|_| anyhow::anyhow!("arbiter has shut down"))
    }

    pub async fn remote(&self, cmd: RemoteCommand) -> anyhow::Result<()> {
        self.send(Input::Remote(cmd)).await
    }

    /// Submit an approval request and wait for the human's answer.
    pub async fn request_approval(&self, request: ApprovalRequest) -> anyhow::Result<ApprovalReply> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::ApprovalRequested { request, reply }).await?;
        rx.await
            .map_err(|_| anyhow::anyhow!("approval request was dropped without a decision"))
    }
}

/// Bounds applied to [`ArbiterOptions::exit_confirm_window`].
pub const EXIT_WINDOW_MIN: Duration = Duration::from_secs(1);
pub const EXIT_WINDOW_MAX: Duration = Duration::from_secs(24 * 60 * 60);

pub struct ArbiterOptions {
    pub buffer: MessageBuffer,
    pub hints: OptionHints,
    /// Committed settings at startup.
    pub settings: RunSettings,
    pub mode: ControlMode,
    pub exit_confirm_window: Duration,
    pub history_limit: usize,
}

impl ArbiterOptions {
    pub fn new(buffer: MessageBuffer, hints: OptionHints) -> Self {
        Self {
            buffer,
            hints,
            settings: RunSettings::default(),
            mode: ControlMode::Local,
            exit_confirm_window: Duration::from_secs(15),
            history_limit: 50,
        }
    }

    pub fn from_config(config: &Config, buffer: MessageBuffer, hints: OptionHints) -> Self {
        Self {
            settings: RunSettings::with_permission_mode(config.agent.default_permission_mode),
            exit_confirm_window: Duration::from_secs(config.tui.exit_confirm_secs),
            history_limit: config.tui.history_limit,
            ..Self::new(buffer, hints)
        }
    }
}

fn clamp_exit_window(window: Duration) -> Duration {
    let clamped = window.clamp(EXIT_WINDOW_MIN, EXIT_WINDOW_MAX);
    if clamped != window {
        warn!(
            requested_secs = window.as_secs(),
            used_secs = clamped.as_secs(),
            "exit confirmation window out of range"
        );
    }
    clamped
}

pub struct Arbiter {
    mode: ControlMode,
    screen: Screen,
    committed: RunSettings,
    hints: OptionHints,
    editor: PromptEditor,
    buffer: MessageBuffer,
    approvals: ApprovalRelay,
    collab: Collaborators,
    exit_window: Duration,
    /// Bumped every time the exit confirmation is armed.
    confirm_generation: u64,
    exited: bool,
    input_rx: mpsc::Receiver<Input>,
    internal_rx: mpsc::Receiver<Internal>,
    internal_tx: mpsc::Sender<Internal>,
}

impl Arbiter {
    pub fn new(opts: ArbiterOptions, collab: Collaborators) -> (Self, InputHandle) {
        let (tx, input_rx) = mpsc::channel(256);
        let (internal_tx, internal_rx) = mpsc::channel(16);
        let arbiter = Self {
            mode: opts.mode,
            screen: Screen::Normal,
            committed: opts.settings,
            hints: opts.hints,
            editor: PromptEditor::new(opts.history_limit),
            buffer: opts.buffer,
            approvals: ApprovalRelay::new(),
            collab,
            exit_window: clamp_exit_window(opts.exit_confirm_window),
            confirm_generation: 0,
            exited: false,
            input_rx,
            internal_rx,
            internal_tx,
        };
        (arbiter, InputHandle { tx })
    }

    /// Process inputs until exit or until every [`InputHandle`] is dropped.
    pub async fn run(mut self) {
        info!(mode = %self.mode, "arbiter started");
        while self.step().await {}
        info!("arbiter stopped");
    }

    /// Wait for and process one input or internal completion.  Returns
    /// `false` once the arbiter has exited or its input channel closed.
    pub async fn step(&mut self) -> bool {
        if self.exited {
            return false;
        }
        tokio::select! {
            msg = self.input_rx.recv() => {
                let Some(input) = msg else { return false };
                self.handle_input(input).await;
            }
            Some(internal) = self.internal_rx.recv() => {
                self.handle_internal(internal);
            }
        }
        !self.exited
    }

    /// Process a single input immediately.
    pub async fn handle_input(&mut self, input: Input) {
        if self.exited {
            debug!("input after exit ignored");
            return;
        }
        match input {
            // Agent traffic is never blocked by a running local action.
            Input::ApprovalRequested { request, reply } => self.register_approval(request, reply),
            input if matches!(self.screen, Screen::ActionInProgress(_)) => {
                debug!(?input, "action in progress: input ignored");
            }
            Input::Key(key) => {
                if let Some(action) = map_key(key) {
                    self.handle_action(action).await;
                }
            }
            Input::Action(action) => self.handle_action(action).await,
            Input::Remote(cmd) => self.handle_remote(cmd).await,
            Input::ApprovalDecided { id, decision, origin } => {
                self.decide_approval(&id, decision, origin);
            }
        }
    }

    fn handle_internal(&mut self, msg: Internal) {
        match msg {
            Internal::ConfirmExpired(generation) => self.on_confirm_expired(generation),
            Internal::CommitFinished(result) => self.on_commit_finished(result),
        }
    }

    async fn handle_action(&mut self, action: Action) {
        if action == Action::Interrupt {
            self.interrupt().await;
            return;
        }
        // Anything but a second interrupt cancels a pending exit and is then
        // handled as if the confirmation had never been armed.
        self.disarm_exit();
        match self.screen {
            Screen::Normal => self.prompt_action(action).await,
            Screen::Settings(_) => self.settings_action(action),
            Screen::ConfirmExit(_) | Screen::ActionInProgress(_) => {}
        }
    }

    // ── Event helpers ─────────────────────────────────────────────────────────

    fn system(&self, content: impl Into<String>) {
        self.buffer.append(SessionEvent::system(content));
    }

    fn status(&self, content: impl Into<String>) {
        self.buffer.append(SessionEvent::new(EventKind::Status, content));
    }

    // ── Read-only accessors ───────────────────────────────────────────────────

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn sub_state(&self) -> SubState {
        self.screen.sub_state()
    }

    pub fn committed(&self) -> &RunSettings {
        &self.committed
    }

    pub fn editor(&self) -> &PromptEditor {
        &self.editor
    }

    pub fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn pending_approvals(&self) -> usize {
        self.approvals.len()
    }

    pub fn view(&self) -> ArbiterView {
        let settings = match &self.screen {
            Screen::Settings(o) | Screen::ActionInProgress(o) => Some(SettingsView::from(o)),
            _ => None,
        };
        ArbiterView {
            mode: self.mode,
            sub_state: self.screen.sub_state(),
            committed: self.committed.clone(),
            exit_armed: matches!(self.screen, Screen::ConfirmExit(_)),
            prompt: self.editor.text().to_string(),
            prompt_cursor: self.editor.cursor(),
            settings,
            pending_approvals: self.approvals.pending().map(|(id, _)| id.to_string()).collect(),
        }
    }
}
