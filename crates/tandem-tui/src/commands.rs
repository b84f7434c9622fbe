// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Slash commands recognised at the prompt.
//!
//! Supported syntax:
//!   /settings
//!   /remote
//!   /local
//!   /exit                      (alias /quit)
//!   /approve [id]
//!   /approve-session [id]
//!   /deny [id]
//!   /abort [id]
//!
//! A line is a command only when, once trimmed, it matches one of the forms
//! above exactly.  Anything else starting with `/` is an ordinary prompt and
//! goes to the agent unchanged.

use tandem_approval::ApprovalDecision;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// Open the settings overlay.
    Settings,
    /// Hand control to the remote device.
    Remote,
    /// Take control locally.  A no-op when the terminal already has it.
    Local,
    Exit,
    /// Decide a pending approval; without an id, the oldest one.
    Decide {
        decision: ApprovalDecision,
        id: Option<String>,
    },
}

pub fn parse_command(line: &str) -> Option<SlashCommand> {
    let body = line.trim().strip_prefix('/')?;
    let mut tokens = body.split_whitespace();
    let name = tokens.next()?;
    let arg = tokens.next();
    if tokens.next().is_some() {
        return None;
    }

    let decision = match name {
        "approve" => Some(ApprovalDecision::Approved),
        "approve-session" => Some(ApprovalDecision::ApprovedForSession),
        "deny" => Some(ApprovalDecision::Denied),
        "abort" => Some(ApprovalDecision::Abort),
        _ => None,
    };
    if let Some(decision) = decision {
        return Some(SlashCommand::Decide { decision, id: arg.map(String::from) });
    }

    // The remaining commands take no arguments.
    if arg.is_some() {
        return None;
    }
    match name {
        "settings" => Some(SlashCommand::Settings),
        "remote" => Some(SlashCommand::Remote),
        "local" => Some(SlashCommand::Local),
        "exit" | "quit" => Some(SlashCommand::Exit),
        _ => None,
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
