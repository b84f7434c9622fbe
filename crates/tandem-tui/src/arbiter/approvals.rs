// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use tandem_approval::{ApprovalDecision, ApprovalReply, ApprovalRequest};
use tandem_session::SessionEvent;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::Arbiter;
use crate::state::ControlMode;

impl Arbiter {
    pub(super) fn register_approval(
        &mut self,
        request: ApprovalRequest,
        reply: oneshot::Sender<ApprovalReply>,
    ) {
        let summary = request.summary();
        match self.approvals.register(request, reply) {
            Ok(id) => {
                self.buffer.append(SessionEvent::tool(format!("Approval needed [{id}]: {summary}")));
            }
            // The reply sender is dropped with the request: the agent sees a
            // closed channel.
            Err(e) => {
                warn!(error = %e, "approval request rejected");
                self.system(format!("Rejected approval request: {e}"));
            }
        }
    }

    /// Only the side holding control may decide.
    pub(super) fn decide_approval(&mut self, id: &str, decision: ApprovalDecision, origin: ControlMode) {
        if origin != self.mode {
            debug!(%id, %origin, mode = %self.mode, "approval decision from side without control");
            self.system(format!(
                "Ignored {decision} for [{id}] from {origin}: {} has control",
                self.mode
            ));
            return;
        }
        match self.approvals.resolve(id, decision) {
            Ok(_) => self.system(format!("Approval [{id}]: {decision}")),
            Err(e) => self.system(format!("Cannot decide approval: {e}")),
        }
    }
}
