// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `config show` / `config init`.

use tracing::info;

use alphajet_core::config::ClientConfig;
use alphajet_core::error::Result;

use crate::cli::{ConfigCommand, Overrides};

pub fn run(overrides: &Overrides, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let mut config = overrides.resolve()?;
            if !config.endpoint.ftp_password.is_empty() {
                config.endpoint.ftp_password = "<redacted>".into();
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigCommand::Init => {
            let path = overrides.config_path();
            if path.exists() {
                println!("{} already exists", path.display());
                return Ok(());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            ClientConfig::default().save(&path)?;
            info!(path = %path.display(), "wrote default configuration");
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}
