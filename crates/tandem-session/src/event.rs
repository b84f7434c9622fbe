// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who or what produced a [`SessionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    User,
    Assistant,
    System,
    Tool,
    Result,
    Status,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::User => "user",
            EventKind::Assistant => "assistant",
            EventKind::System => "system",
            EventKind::Tool => "tool",
            EventKind::Result => "result",
            EventKind::Status => "status",
        };
        f.write_str(s)
    }
}

/// One unit of observable agent activity.
///
/// Fields are private: an event never changes after it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    id: Uuid,
    #[serde(rename = "type")]
    kind: EventKind,
    content: String,
    timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(EventKind::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(EventKind::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(EventKind::System, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(EventKind::Tool, content)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SessionEvent::user("hi");
        let b = SessionEvent::user("hi");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn kind_serializes_under_type_key() {
        let ev = SessionEvent::system("saved");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["content"], "saved");
        assert!(json.get("timestamp").is_some());
    }
}
