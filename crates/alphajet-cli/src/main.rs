// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// alphajet — command-line client for alphaJET inkjet printers.
//
// Entry point. Initialises logging, resolves the configuration, runs one
// command and turns any failure into a plain-English message.

mod cli;
mod commands;
mod data_dir;

use std::process::ExitCode;

use clap::Parser;

use alphajet_core::error::AlphaJetError;
use alphajet_core::human_errors::{HumanError, Severity, humanize_error};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "alphajet starting");

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print a failure for the operator, keeping the technical detail and any
/// captured printer output underneath.
fn report(err: &AlphaJetError) {
    let human = humanize_error(err);
    match human.severity {
        Severity::Transient => tracing::warn!(error = %err, "command failed"),
        Severity::ActionRequired | Severity::Permanent => {
            tracing::error!(error = %err, "command failed")
        }
    }
    eprintln!("{}", human.message);
    eprintln!("{}", human.suggestion);
    if let Some(hint) = retry_hint(&human) {
        eprintln!("{hint}");
    }
    if let Some(text) = err.diagnostic_text() {
        eprintln!("--- printer output ---");
        eprintln!("{}", text.escape_debug());
    }
}

/// Extra line telling the operator whether running the command again is
/// worth it.
fn retry_hint(human: &HumanError) -> Option<&'static str> {
    match (human.retriable, human.severity) {
        (true, _) => Some(
            "This is usually temporary. `status` and `send` accept --retries to try again automatically.",
        ),
        (false, Severity::Permanent) => Some("Running the command again will not help."),
        (false, _) => None,
    }
}
