// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Interactive session with in-process collaborators.
//!
//! No agent or device is attached: prompts are echoed into the session log,
//! settings are committed in memory and handoffs only log.  Useful for trying
//! the arbiter from a real terminal.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use crossterm::event::{Event, EventStream};
use crossterm::{cursor, queue, style::Print, terminal};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tandem_config::{Config, OptionHints};
use tandem_session::{MessageBuffer, SessionEvent};
use tandem_tui::{
    Arbiter, ArbiterOptions, ArbiterView, Collaborators, ControlMode, ExitHandler, Input,
    InputHandle, PromptSink, RunSettings, SettingsCommitter, SubState, SwitchHandler,
};

use crate::cli::SessionArgs;

// ── Collaborators ─────────────────────────────────────────────────────────────

pub struct EchoSink {
    buffer: MessageBuffer,
}

#[async_trait]
impl PromptSink for EchoSink {
    async fn submit(&self, text: String) -> anyhow::Result<()> {
        self.buffer.append(SessionEvent::user(text));
        self.buffer.append(SessionEvent::assistant("(no agent attached)"));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCommitter {
    current: Mutex<Option<RunSettings>>,
}

#[async_trait]
impl SettingsCommitter for MemoryCommitter {
    async fn commit(&self, settings: RunSettings) -> anyhow::Result<()> {
        info!(settings = %settings.summary(), "settings committed in memory");
        *self.current.lock().unwrap_or_else(|poison| poison.into_inner()) = Some(settings);
        Ok(())
    }
}

pub struct LoggingSwitch {
    target: ControlMode,
}

#[async_trait]
impl SwitchHandler for LoggingSwitch {
    async fn switch(&self) -> anyhow::Result<()> {
        info!(to = %self.target, "loopback handoff");
        Ok(())
    }
}

pub struct LoggingExit;

#[async_trait]
impl ExitHandler for LoggingExit {
    async fn exit(&self) {
        info!("session ended by user");
    }
}

pub fn loopback_collaborators(buffer: &MessageBuffer) -> Collaborators {
    Collaborators::new(
        Arc::new(EchoSink { buffer: buffer.clone() }),
        Arc::new(MemoryCommitter::default()),
        Arc::new(LoggingExit),
    )
    .with_switch_to_local(Arc::new(LoggingSwitch { target: ControlMode::Local }))
    .with_switch_to_remote(Arc::new(LoggingSwitch { target: ControlMode::Remote }))
}

// ── Terminal ──────────────────────────────────────────────────────────────────

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enabling raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

/// Forward terminal key events to the arbiter until the stream ends.
async fn pump_keys(handle: InputHandle) {
    let mut events = EventStream::new();
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Key(key)) => {
                if handle.send(Input::Key(key)).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "terminal event stream failed");
                break;
            }
        }
    }
    debug!("key pump stopped");
}

fn status_line(view: &ArbiterView) -> String {
    match view.sub_state {
        SubState::Normal if view.mode == ControlMode::Remote => {
            "[remote device has control, Ctrl+C to take it back]".to_string()
        }
        SubState::Normal => format!("> {}", view.prompt),
        SubState::Confirmation => "Press Ctrl+C again to exit".to_string(),
        SubState::ActionInProgress => "Saving settings…".to_string(),
        SubState::SettingsOverlay | SubState::SettingsPicker | SubState::SettingsEditing => {
            let Some(s) = &view.settings else {
                return String::new();
            };
            if let Some(text) = &s.editing {
                return format!("custom value: {text}_");
            }
            if let Some(p) = &s.picker {
                let label = p.options.get(p.selected).map(|o| o.label.as_str()).unwrap_or("");
                return format!("{}: {label}  ({}/{})", p.field, p.selected + 1, p.options.len());
            }
            let d = &s.draft;
            format!(
                "settings [{:?}] permission={} model={} effort={} profile={}",
                s.cursor,
                d.permission_mode,
                or_default(&d.model),
                or_default(&d.reasoning_effort),
                or_default(&d.profile),
            )
        }
    }
}

fn or_default(s: &str) -> &str {
    if s.is_empty() {
        "default"
    } else {
        s
    }
}

fn render_status(view: &ArbiterView) -> io::Result<()> {
    let mut out = io::stdout();
    queue!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(terminal::ClearType::CurrentLine),
        Print(status_line(view)),
    )?;
    out.flush()
}

// ── Session ───────────────────────────────────────────────────────────────────

pub async fn run_session(config: &Config, hints: OptionHints, args: &SessionArgs) -> anyhow::Result<()> {
    if !io::stdin().is_terminal() {
        anyhow::bail!("an interactive session needs a terminal on stdin");
    }

    let buffer = MessageBuffer::new(config.session.buffer_capacity);
    let mut opts = ArbiterOptions::from_config(config, buffer.clone(), hints);
    if let Some(mode) = args.permission_mode {
        opts.settings.permission_mode = mode;
    }
    if args.remote {
        opts.mode = ControlMode::Remote;
    }
    let (mut arbiter, handle) = Arbiter::new(opts, loopback_collaborators(&buffer));

    // Print every event once, in order.
    let mut printed: Option<Uuid> = None;
    let _subscription = buffer.subscribe(move |view| {
        let start = printed
            .and_then(|id| view.iter().position(|e: &SessionEvent| e.id() == id))
            .map_or(0, |i| i + 1);
        let mut out = io::stdout();
        for ev in &view[start..] {
            queue!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine),
                Print(format!("[{}] {}\r\n", ev.kind(), ev.content())),
            )?;
        }
        out.flush()?;
        printed = view.last().map(SessionEvent::id).or(printed);
        Ok(())
    });

    let _raw = RawMode::enable()?;
    render_status(&arbiter.view())?;
    let pump = tokio::spawn(pump_keys(handle));
    while arbiter.step().await {
        render_status(&arbiter.view())?;
    }
    pump.abort();
    print!("\r\n");
    Ok(())
}
