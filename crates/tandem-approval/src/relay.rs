// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Pending-approval registry.
//!
//! The agent side registers a validated request together with the sender half
//! of a oneshot channel and then awaits the receiver.  When a human decides,
//! [`ApprovalRelay::resolve`] builds the protocol response, attaches the
//! request's original vendor fields, and unblocks the agent.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{build_response, ApprovalDecision, ApprovalRequest, ApprovalResponse, VendorFields};
use crate::ApprovalError;

/// Response correlated with the request it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalReply {
    pub id: String,
    #[serde(flatten)]
    pub response: ApprovalResponse,
    /// The request's vendor fields, unchanged.
    #[serde(flatten)]
    pub vendor: VendorFields,
}

struct PendingApproval {
    request: ApprovalRequest,
    reply_tx: oneshot::Sender<ApprovalReply>,
}

#[derive(Default)]
pub struct ApprovalRelay {
    pending: HashMap<String, PendingApproval>,
    /// Registration order, for listing.
    order: Vec<String>,
}

impl ApprovalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request.  The id is the vendor call id when present,
    /// otherwise a fresh UUID.
    pub fn register(
        &mut self,
        request: ApprovalRequest,
        reply_tx: oneshot::Sender<ApprovalReply>,
    ) -> Result<String, ApprovalError> {
        let id = request
            .vendor
            .call_id()
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.pending.contains_key(&id) {
            return Err(ApprovalError::DuplicateRequest(id));
        }
        info!(%id, kind = ?request.vendor.kind(), "approval requested");
        self.order.push(id.clone());
        self.pending.insert(id.clone(), PendingApproval { request, reply_tx });
        Ok(id)
    }

    /// Resolve a pending request and send the reply to the agent.
    ///
    /// A dropped receiver is not an error: the agent may have moved on, the
    /// request is still considered resolved.
    pub fn resolve(
        &mut self,
        id: &str,
        decision: ApprovalDecision,
    ) -> Result<ApprovalReply, ApprovalError> {
        let Some(pending) = self.pending.remove(id) else {
            warn!(%id, "resolve: no pending approval");
            return Err(ApprovalError::UnknownRequest(id.to_string()));
        };
        self.order.retain(|p| p != id);

        let reply = ApprovalReply {
            id: id.to_string(),
            response: build_response(decision),
            vendor: pending.request.vendor,
        };
        info!(%id, %decision, action = ?reply.response.action, "approval resolved");
        if pending.reply_tx.send(reply.clone()).is_err() {
            warn!(%id, "approval reply receiver dropped");
        }
        Ok(reply)
    }

    /// Resolve everything still pending with `abort`.
    pub fn abort_all(&mut self) -> Vec<ApprovalReply> {
        let ids = std::mem::take(&mut self.order);
        ids.iter()
            .filter_map(|id| self.resolve(id, ApprovalDecision::Abort).ok())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ApprovalRequest> {
        self.pending.get(id).map(|p| &p.request)
    }

    /// Pending requests in registration order.
    pub fn pending(&self) -> impl Iterator<Item = (&str, &ApprovalRequest)> {
        self.order
            .iter()
            .filter_map(|id| self.pending.get(id).map(|p| (id.as_str(), &p.request)))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_request, ApprovalAction};
    use serde_json::json;

    fn exec_request(call_id: &str) -> ApprovalRequest {
        parse_request(json!({
            "message": "Allow?",
            "requestedSchema": {},
            "codex_elicitation": "exec-approval",
            "codex_call_id": call_id,
            "codex_command": ["/bin/sh", "-c", "echo hi"],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn resolve_sends_correlated_reply() {
        let mut relay = ApprovalRelay::new();
        let (tx, rx) = oneshot::channel();
        let id = relay.register(exec_request("call_7"), tx).unwrap();
        assert_eq!(id, "call_7");

        relay.resolve(&id, ApprovalDecision::Denied).unwrap();
        let reply = rx.await.unwrap();
        assert_eq!(reply.response.action, ApprovalAction::Decline);
        assert_eq!(reply.vendor.command(), Some(vec!["/bin/sh", "-c", "echo hi"]));
        assert!(relay.is_empty());
    }

    #[test]
    fn id_falls_back_to_uuid() {
        let mut relay = ApprovalRelay::new();
        let req = parse_request(json!({"message": "m", "requestedSchema": {}})).unwrap();
        let (tx, _rx) = oneshot::channel();
        let id = relay.register(req, tx).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut relay = ApprovalRelay::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        relay.register(exec_request("dup"), tx1).unwrap();
        let err = relay.register(exec_request("dup"), tx2).unwrap_err();
        assert!(matches!(err, ApprovalError::DuplicateRequest(id) if id == "dup"));
        assert_eq!(relay.len(), 1);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut relay = ApprovalRelay::new();
        assert!(matches!(
            relay.resolve("nope", ApprovalDecision::Approved),
            Err(ApprovalError::UnknownRequest(_))
        ));
    }

    #[test]
    fn dropped_receiver_still_resolves() {
        let mut relay = ApprovalRelay::new();
        let (tx, rx) = oneshot::channel();
        relay.register(exec_request("gone"), tx).unwrap();
        drop(rx);
        assert!(relay.resolve("gone", ApprovalDecision::Approved).is_ok());
    }

    #[tokio::test]
    async fn abort_all_cancels_everything_in_order() {
        let mut relay = ApprovalRelay::new();
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        relay.register(exec_request("a"), tx_a).unwrap();
        relay.register(exec_request("b"), tx_b).unwrap();
        let ids: Vec<&str> = relay.pending().map(|(id, _)| id).collect();
        assert_eq!(ids, ["a", "b"]);

        let replies = relay.abort_all();
        assert_eq!(replies.len(), 2);
        assert_eq!(rx_a.await.unwrap().response.action, ApprovalAction::Cancel);
        assert_eq!(rx_b.await.unwrap().response.action, ApprovalAction::Cancel);
        assert!(relay.is_empty());
    }

    #[test]
    fn reply_serializes_flat() {
        let mut relay = ApprovalRelay::new();
        let (tx, _rx) = oneshot::channel();
        relay.register(exec_request("c1"), tx).unwrap();
        let reply = relay.resolve("c1", ApprovalDecision::ApprovedForSession).unwrap();
        let v = serde_json::to_value(&reply).unwrap();
        assert_eq!(v["id"], "c1");
        assert_eq!(v["action"], "accept");
        assert_eq!(v["decision"], "approved_for_session");
        assert_eq!(v["codex_call_id"], "c1");
    }
}
