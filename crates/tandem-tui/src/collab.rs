// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The arbiter's outside world.
//!
//! Everything the arbiter cannot decide on its own (sending a prompt to the
//! agent, persisting settings, moving control between devices, tearing the
//! session down) goes through one of these traits.  Failures come back as
//! `anyhow::Error` and are turned into system events by the arbiter; they
//! never end the input loop.

use std::sync::Arc;

use async_trait::async_trait;

use crate::settings::RunSettings;

/// Forwards a submitted prompt to the agent.
#[async_trait]
pub trait PromptSink: Send + Sync {
    async fn submit(&self, text: String) -> anyhow::Result<()>;
}

/// Persists / applies a normalized set of run settings.
#[async_trait]
pub trait SettingsCommitter: Send + Sync {
    async fn commit(&self, settings: RunSettings) -> anyhow::Result<()>;
}

/// Moves input control to one side.
#[async_trait]
pub trait SwitchHandler: Send + Sync {
    async fn switch(&self) -> anyhow::Result<()>;
}

/// Terminal exit.  Called at most once per arbiter.
#[async_trait]
pub trait ExitHandler: Send + Sync {
    async fn exit(&self);
}

#[derive(Clone)]
pub struct Collaborators {
    pub prompts: Arc<dyn PromptSink>,
    pub settings: Arc<dyn SettingsCommitter>,
    pub exit: Arc<dyn ExitHandler>,
    /// Remote → local.  Without it, an interrupt in remote mode arms the
    /// exit confirmation instead.
    pub switch_to_local: Option<Arc<dyn SwitchHandler>>,
    /// Local → remote.  Without it, `/remote` and remote control requests
    /// are refused.
    pub switch_to_remote: Option<Arc<dyn SwitchHandler>>,
}

impl Collaborators {
    pub fn new(
        prompts: Arc<dyn PromptSink>,
        settings: Arc<dyn SettingsCommitter>,
        exit: Arc<dyn ExitHandler>,
    ) -> Self {
        Self { prompts, settings, exit, switch_to_local: None, switch_to_remote: None }
    }

    pub fn with_switch_to_local(mut self, handler: Arc<dyn SwitchHandler>) -> Self {
        self.switch_to_local = Some(handler);
        self
    }

    pub fn with_switch_to_remote(mut self, handler: Arc<dyn SwitchHandler>) -> Self {
        self.switch_to_remote = Some(handler);
        self
    }
}
