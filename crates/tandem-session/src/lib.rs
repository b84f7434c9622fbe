// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
pub mod buffer;
pub mod event;

pub use buffer::{MessageBuffer, Subscription, DEFAULT_CAPACITY};
pub use event::{EventKind, SessionEvent};
