// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
mod cli;
mod loopback;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, DecisionArg, SessionArgs};
use tandem_approval::{ApprovalRelay, ApprovalRequest};
use tandem_config::{load_hints, Config, OptionHints};
use tandem_tui::{build_options, PickerField};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Session(SessionArgs::default()));
    match command {
        Commands::Completions { shell } => {
            cli::print_completions(shell);
            Ok(())
        }
        Commands::ShowConfig => {
            let loaded = tandem_config::load_layered(cli.config.as_deref())?;
            for source in &loaded.sources {
                println!("# from {}", source.display());
            }
            print!("{}", serde_yaml::to_string(&loaded.config).context("serializing config")?);
            Ok(())
        }
        Commands::Hints { agent_config } => {
            let config = tandem_config::load(cli.config.as_deref())?;
            let hints = resolve_hints(&config, agent_config.as_deref());
            print_hints(&hints)
        }
        Commands::Approval { decision, file } => approval_cmd(decision, file.as_deref()),
        Commands::Session(args) => {
            let config = tandem_config::load(cli.config.as_deref())?;
            let hints = resolve_hints(&config, args.agent_config.as_deref());
            loopback::run_session(&config, hints, &args).await
        }
    }
}

fn resolve_hints(config: &Config, explicit: Option<&Path>) -> OptionHints {
    let path: PathBuf = match explicit {
        Some(p) => p.to_path_buf(),
        None => config.agent.resolved_config_path(),
    };
    load_hints(&path)
}

fn print_hints(hints: &OptionHints) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(hints).context("serializing hints")?);
    for field in [PickerField::Model, PickerField::ReasoningEffort, PickerField::Profile] {
        println!("\n{field}:");
        for option in build_options(field, hints, "") {
            match &option.description {
                Some(d) => println!("  {:<24} {d}", option.label),
                None => println!("  {}", option.label),
            }
        }
    }
    Ok(())
}

/// Validate a request and print the correlated response for `decision`.
fn approval_cmd(decision: DecisionArg, file: Option<&Path>) -> anyhow::Result<()> {
    let text = match file {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("reading approval request {}", p.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading approval request from stdin")?;
            buf
        }
    };
    let request: ApprovalRequest = text.parse()?;

    let mut relay = ApprovalRelay::new();
    let (tx, _rx) = tokio::sync::oneshot::channel();
    let id = relay.register(request, tx)?;
    let reply = relay.resolve(&id, decision.into())?;
    println!("{}", serde_json::to_string_pretty(&reply).context("serializing response")?);
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
