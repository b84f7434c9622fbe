// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod error;
pub mod protocol;
pub mod relay;

pub use error::ApprovalError;
pub use protocol::{
    build_response, decision_to_action, parse_request, ApprovalAction, ApprovalDecision,
    ApprovalKind, ApprovalRequest, ApprovalResponse, VendorFields,
};
pub use relay::{ApprovalRelay, ApprovalReply};
