// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tandem_approval::ApprovalDecision;
use tandem_config::PermissionMode;

#[derive(Parser, Debug)]
#[command(
    name = "tandem",
    about = "Drive a coding agent from the terminal while a paired device watches or takes over",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true, env = "TANDEM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive session (the default)
    Session(SessionArgs),
    /// Print the option hints read from the agent config and the resulting
    /// picker lists
    Hints {
        /// Agent config to read (default: `agent.config_path` from config)
        #[arg(long, value_name = "PATH")]
        agent_config: Option<PathBuf>,
    },
    /// Validate an approval request and print the response for a decision.
    ///
    /// Vendor fields of the request are echoed back unchanged.
    Approval {
        #[arg(long, short = 'd', value_enum)]
        decision: DecisionArg,
        /// Request JSON file; `-` or omitted reads stdin
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Start with the remote device holding control
    #[arg(long)]
    pub remote: bool,

    /// Permission mode to start with (overrides `agent.default_permission_mode`)
    #[arg(long, short = 'p', value_enum)]
    pub permission_mode: Option<PermissionMode>,

    /// Agent config to read option hints from
    #[arg(long, value_name = "PATH")]
    pub agent_config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Approved,
    ApprovedForSession,
    Denied,
    Abort,
}

impl From<DecisionArg> for ApprovalDecision {
    fn from(d: DecisionArg) -> Self {
        match d {
            DecisionArg::Approved => ApprovalDecision::Approved,
            DecisionArg::ApprovedForSession => ApprovalDecision::ApprovedForSession,
            DecisionArg::Denied => ApprovalDecision::Denied,
            DecisionArg::Abort => ApprovalDecision::Abort,
        }
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tandem", &mut std::io::stdout());
}
