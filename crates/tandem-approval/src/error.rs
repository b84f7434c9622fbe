// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("invalid approval request: {0}")]
    Validation(String),

    #[error("approval {0} is already pending")]
    DuplicateRequest(String),

    #[error("no pending approval with id {0}")]
    UnknownRequest(String),
}
