// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Wire types for the agent's approval round trip.
//!
//! ```text
//! Agent                                  tandem                 Human
//!   │── ApprovalRequest {message,         │                        │
//!   │     requestedSchema, codex_*…} ────►│── "Approval needed" ──►│
//!   │                                     │◄── ApprovalDecision ───│
//!   │◄── {action, decision} + codex_* ────│                        │
//! ```
//!
//! Only `message` and `requestedSchema` are validated.  Every other key is a
//! vendor field: it is kept verbatim (order included) and handed back when the
//! response is correlated, whether or not its shape is understood here.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ApprovalError;

// ── Decisions and actions ─────────────────────────────────────────────────────

/// What the human chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    /// Approve this and identical future requests for the rest of the session.
    ApprovedForSession,
    /// Skip this action; the agent carries on.
    Denied,
    /// Stop the turn.
    Abort,
}

impl ApprovalDecision {
    pub const ALL: [ApprovalDecision; 4] = [
        ApprovalDecision::Approved,
        ApprovalDecision::ApprovedForSession,
        ApprovalDecision::Denied,
        ApprovalDecision::Abort,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "approved",
            ApprovalDecision::ApprovedForSession => "approved_for_session",
            ApprovalDecision::Denied => "denied",
            ApprovalDecision::Abort => "abort",
        }
    }
}

impl std::fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action the approval protocol expects in its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Accept,
    Decline,
    Cancel,
}

pub fn decision_to_action(decision: ApprovalDecision) -> ApprovalAction {
    match decision {
        ApprovalDecision::Approved | ApprovalDecision::ApprovedForSession => ApprovalAction::Accept,
        ApprovalDecision::Denied => ApprovalAction::Decline,
        ApprovalDecision::Abort => ApprovalAction::Cancel,
    }
}

/// Reply body.  `decision` is carried alongside `action` so the agent can
/// tell a one-off accept from an accept-for-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub action: ApprovalAction,
    pub decision: ApprovalDecision,
}

pub fn build_response(decision: ApprovalDecision) -> ApprovalResponse {
    ApprovalResponse { action: decision_to_action(decision), decision }
}

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub message: String,
    pub requested_schema: Map<String, Value>,
    #[serde(flatten)]
    pub vendor: VendorFields,
}

/// Validate an inbound request.  Structural fields must be present and
/// well-typed; everything else is accepted as is.
pub fn parse_request(value: Value) -> Result<ApprovalRequest, ApprovalError> {
    if !value.is_object() {
        return Err(ApprovalError::Validation("request must be a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| ApprovalError::Validation(e.to_string()))
}

impl std::str::FromStr for ApprovalRequest {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| ApprovalError::Validation(e.to_string()))?;
        parse_request(value)
    }
}

impl ApprovalRequest {
    /// One-line description for the session log.
    pub fn summary(&self) -> String {
        let v = &self.vendor;
        match (v.command(), v.changes()) {
            (Some(cmd), _) => match v.cwd() {
                Some(cwd) => format!("run `{}` in {}", cmd.join(" "), cwd.display()),
                None => format!("run `{}`", cmd.join(" ")),
            },
            (None, Some(changes)) => {
                let n = changes.len();
                let noun = if n == 1 { "file" } else { "files" };
                format!("apply changes to {n} {noun}")
            }
            _ => self.message.clone(),
        }
    }
}

// ── Vendor fields ─────────────────────────────────────────────────────────────

pub const KEY_KIND: &str = "codex_elicitation";
pub const KEY_CALL_ID: &str = "codex_call_id";
pub const KEY_EVENT_ID: &str = "codex_event_id";
pub const KEY_COMMAND: &str = "codex_command";
pub const KEY_CWD: &str = "codex_cwd";
pub const KEY_PARSED_CMD: &str = "codex_parsed_cmd";
pub const KEY_CHANGES: &str = "codex_changes";

/// Discriminator carried in [`KEY_KIND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalKind {
    Exec,
    Patch,
    Other(String),
}

/// Opaque vendor keys with read-only typed views over the ones we know.
///
/// Accessors return `None` both when a key is missing and when its value has
/// an unexpected shape; the raw value is never touched either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorFields(Map<String, Value>);

impl VendorFields {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn kind(&self) -> Option<ApprovalKind> {
        let raw = self.str_field(KEY_KIND)?;
        Some(match raw {
            "exec-approval" => ApprovalKind::Exec,
            "patch-approval" => ApprovalKind::Patch,
            other => ApprovalKind::Other(other.to_string()),
        })
    }

    pub fn call_id(&self) -> Option<&str> {
        self.str_field(KEY_CALL_ID)
    }

    pub fn event_id(&self) -> Option<&str> {
        self.str_field(KEY_EVENT_ID)
    }

    /// The command vector, if every element is a string.
    pub fn command(&self) -> Option<Vec<&str>> {
        self.0.get(KEY_COMMAND)?.as_array()?.iter().map(Value::as_str).collect()
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.str_field(KEY_CWD).map(Path::new)
    }

    pub fn parsed_cmd(&self) -> Option<&Value> {
        self.0.get(KEY_PARSED_CMD)
    }

    /// File path → change descriptor.
    pub fn changes(&self) -> Option<&Map<String, Value>> {
        self.0.get(KEY_CHANGES)?.as_object()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.as_str()
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
