// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command dispatch.

pub mod config;
pub mod gp;
pub mod transfer;

use alphajet_core::error::Result;

use crate::cli::{Cli, Command};

/// Run the parsed command line to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let Cli { overrides, command } = cli;

    match command {
        Command::Status { retries, json } => gp::status(&overrides.resolve()?, retries, json).await,
        Command::Send {
            body,
            raw,
            retries,
            json,
        } => gp::send(&overrides.resolve()?, &body, raw, retries, json).await,
        Command::Parse { file, json } => gp::parse(file.as_deref(), json),
        Command::Probe => gp::probe(&overrides.resolve()?).await,
        Command::Upload {
            local,
            remote_dir,
            secure,
        } => transfer::upload(&overrides.resolve()?, &local, &remote_dir, secure).await,
        Command::Download {
            remote,
            local_dir,
            secure,
            sha256,
        } => {
            transfer::download(
                &overrides.resolve()?,
                &remote,
                &local_dir,
                secure,
                sha256.as_deref(),
            )
            .await
        }
        Command::Config(sub) => config::run(&overrides, sub),
    }
}
