// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface and configuration resolution.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use alphajet_core::config::ClientConfig;
use alphajet_core::error::Result;
use alphajet_core::types::ResponseDecoding;

use crate::data_dir;

#[derive(Debug, Parser)]
#[command(name = "alphajet", version, about = "Talk to an alphaJET inkjet printer")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that take precedence over the configuration file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Configuration file (JSON). Defaults to the data directory.
    #[arg(long, global = true, env = "ALPHAJET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Printer host name or IP address.
    #[arg(long, global = true, env = "ALPHAJET_HOST")]
    pub host: Option<String>,

    /// GP command port.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// FTP port.
    #[arg(long, global = true)]
    pub file_port: Option<u16>,

    /// Connect / receive timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Fail on non-ASCII bytes in responses instead of dropping them.
    #[arg(long, global = true)]
    pub strict_decoding: bool,

    /// FTP user name.
    #[arg(long, global = true, env = "ALPHAJET_FTP_USER")]
    pub ftp_user: Option<String>,

    /// FTP password.
    #[arg(long, global = true, env = "ALPHAJET_FTP_PASSWORD", hide_env_values = true)]
    pub ftp_password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query printer status.
    Status {
        /// Retries on transient failures.
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Print fields as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send a GP command; the body is wrapped in <GP>...</GP> if needed.
    Send {
        body: String,
        /// Print the raw response instead of parsed fields.
        #[arg(long)]
        raw: bool,
        /// Retries on transient failures.
        #[arg(long, default_value_t = 0)]
        retries: u32,
        /// Print fields as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Extract GP fields from a captured response (file or stdin).
    Parse {
        file: Option<PathBuf>,
        /// Print fields as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check that the command port accepts connections.
    Probe,
    /// Upload a file (e.g. a label template) to the printer.
    Upload {
        local: PathBuf,
        #[arg(long, default_value = "/")]
        remote_dir: String,
        /// Use FTP over TLS.
        #[arg(long)]
        secure: bool,
    },
    /// Download a file (e.g. a log) from the printer.
    Download {
        remote: String,
        #[arg(long, default_value = ".")]
        local_dir: PathBuf,
        /// Use FTP over TLS.
        #[arg(long)]
        secure: bool,
        /// Expected SHA-256 of the file.
        #[arg(long)]
        sha256: Option<String>,
    },
    /// Inspect or create the configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (password hidden).
    Show,
    /// Write a default configuration file if none exists.
    Init,
}

impl Overrides {
    /// Path of the configuration file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(data_dir::default_config_path)
    }

    /// Load the configuration file (defaults when absent) and apply the
    /// command-line overrides on top.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load_or_default(&self.config_path())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.command_port = port;
        }
        if let Some(port) = self.file_port {
            config.endpoint.file_port = port;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.command_timeout_ms = timeout_ms;
        }
        if self.strict_decoding {
            config.decoding = ResponseDecoding::Strict;
        }
        if let Some(user) = &self.ftp_user {
            config.endpoint.ftp_username = user.clone();
        }
        if let Some(password) = &self.ftp_password {
            config.endpoint.ftp_password = password.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    use alphajet_core::error::AlphaJetError;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_beat_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "endpoint": { "host": "10.0.0.9", "command_port": 4000 } }"#,
        )
        .unwrap();

        let overrides = Overrides {
            config: Some(path),
            port: Some(3001),
            timeout_ms: Some(250),
            strict_decoding: true,
            ..Overrides::default()
        };
        let config = overrides.resolve().unwrap();
        assert_eq!(config.endpoint.host, "10.0.0.9");
        assert_eq!(config.endpoint.command_port, 3001);
        assert_eq!(config.command_timeout_ms, 250);
        assert_eq!(config.decoding, ResponseDecoding::Strict);
    }

    #[test]
    fn override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            config: Some(dir.path().join("absent.json")),
            port: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            overrides.resolve().unwrap_err(),
            AlphaJetError::Config(_)
        ));
    }

    #[test]
    fn send_parses_body_and_flags() {
        let cli = Cli::try_parse_from([
            "alphajet",
            "--host",
            "10.1.1.1",
            "send",
            "<STATUS/>",
            "--raw",
            "--retries",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.overrides.host.as_deref(), Some("10.1.1.1"));
        match cli.command {
            Command::Send { body, raw, retries, json } => {
                assert_eq!(body, "<STATUS/>");
                assert!(raw);
                assert_eq!(retries, 2);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
