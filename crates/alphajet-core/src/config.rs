// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration: printer endpoint, timeouts and decoding policy.
//
// Loaded once at startup and passed by value into the GP and FTP clients.
// Nothing in the client mutates it afterwards.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AlphaJetError, Result};
use crate::types::ResponseDecoding;

/// Default GP command port.
pub const DEFAULT_COMMAND_PORT: u16 = 3000;

/// Default FTP port.
pub const DEFAULT_FILE_PORT: u16 = 21;

/// Network location and credentials of one printer.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoint {
    /// Printer host name or IP address.
    pub host: String,
    /// TCP port accepting `<GP>` commands.
    pub command_port: u16,
    /// FTP control port.
    pub file_port: u16,
    /// FTP login name.
    pub ftp_username: String,
    /// FTP password.
    pub ftp_password: String,
}

impl Endpoint {
    /// `host:port` of the GP command channel.
    pub fn command_addr(&self) -> String {
        format!("{}:{}", self.host, self.command_port)
    }

    /// `host:port` of the FTP control channel.
    pub fn file_addr(&self) -> String {
        format!("{}:{}", self.host, self.file_port)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: "192.168.1.185".into(),
            command_port: DEFAULT_COMMAND_PORT,
            file_port: DEFAULT_FILE_PORT,
            ftp_username: "administrator".into(),
            ftp_password: String::new(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("command_port", &self.command_port)
            .field("file_port", &self.file_port)
            .field("ftp_username", &self.ftp_username)
            .field("ftp_password", &"<redacted>")
            .finish()
    }
}

/// Complete client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// The printer to talk to.
    pub endpoint: Endpoint,
    /// Connect / send / per-receive timeout in milliseconds. The printer
    /// does not frame its responses, so this is also the idle gap that ends
    /// a response.
    pub command_timeout_ms: u64,
    /// What to do with non-ASCII bytes in a response.
    pub decoding: ResponseDecoding,
    /// Upper bound on collected response bytes.
    pub max_response_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            command_timeout_ms: 5_000,
            decoding: ResponseDecoding::Lossy,
            max_response_bytes: 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(data) => {
                let config: Self = serde_json::from_str(&data)?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.host.trim().is_empty() {
            return Err(AlphaJetError::Config("printer host is empty".into()));
        }
        if self.endpoint.command_port == 0 {
            return Err(AlphaJetError::Config("command port must be non-zero".into()));
        }
        if self.endpoint.file_port == 0 {
            return Err(AlphaJetError::Config("file port must be non-zero".into()));
        }
        if self.command_timeout_ms == 0 {
            return Err(AlphaJetError::Config("command timeout must be non-zero".into()));
        }
        if self.max_response_bytes == 0 {
            return Err(AlphaJetError::Config(
                "max response size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_printer() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint.command_addr(), "192.168.1.185:3000");
        assert_eq!(config.endpoint.file_addr(), "192.168.1.185:21");
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        assert_eq!(config.decoding, ResponseDecoding::Lossy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "endpoint": { "host": "10.1.2.3" }, "decoding": "strict" }"#,
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.endpoint.host, "10.1.2.3");
        assert_eq!(config.endpoint.command_port, DEFAULT_COMMAND_PORT);
        assert_eq!(config.decoding, ResponseDecoding::Strict);
        assert_eq!(config.command_timeout_ms, 5_000);
    }

    #[test]
    fn empty_host_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "endpoint": { "host": "  " } }"#).unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(matches!(err, AlphaJetError::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = ClientConfig::default();
        config.endpoint.ftp_password = "1324".into();
        config.command_timeout_ms = 750;
        config.save(&path).unwrap();

        assert_eq!(ClientConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn debug_hides_password() {
        let endpoint = Endpoint {
            ftp_password: "hunter2".into(),
            ..Endpoint::default()
        };
        let shown = format!("{endpoint:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
