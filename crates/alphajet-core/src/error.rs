// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the alphaJET client.

use thiserror::Error;

/// Top-level error type for all alphaJET client operations.
#[derive(Debug, Error)]
pub enum AlphaJetError {
    // -- Command transport --
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sending GP command to {addr} failed: {source}")]
    SendFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("receiving GP response from {addr} failed: {source}")]
    ReceiveFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GP response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("non-ASCII byte 0x{byte:02x} at offset {offset} in GP response")]
    InvalidEncoding { offset: usize, byte: u8 },

    #[error("invalid GP command: {0}")]
    InvalidCommand(String),

    // -- Response extraction --
    #[error("GP envelope not found in response ({} bytes)", raw.len())]
    EnvelopeNotFound { raw: String },

    #[error("malformed GP response: {detail}")]
    MalformedXml { detail: String, fragment: String },

    // -- File transfer --
    #[error("file transfer failed: {0}")]
    Transfer(String),

    /// The FTP server answered a step with an unexpected reply code.
    #[error("FTP server rejected {step} with {code}: {message}")]
    FtpRejected {
        step: String,
        code: u32,
        message: String,
    },

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Configuration / local I/O --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlphaJetError {
    /// Raw response text attached to an extraction failure, if any.
    ///
    /// `EnvelopeNotFound` carries the whole decoded response and
    /// `MalformedXml` the sliced envelope fragment.
    pub fn diagnostic_text(&self) -> Option<&str> {
        match self {
            Self::EnvelopeNotFound { raw } => Some(raw),
            Self::MalformedXml { fragment, .. } => Some(fragment),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AlphaJetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_not_found_keeps_raw_text() {
        let err = AlphaJetError::EnvelopeNotFound {
            raw: "HELLO\r\n".into(),
        };
        assert_eq!(err.diagnostic_text(), Some("HELLO\r\n"));
        assert_eq!(err.to_string(), "GP envelope not found in response (7 bytes)");
    }

    #[test]
    fn connect_failure_names_address() {
        let err = AlphaJetError::ConnectFailed {
            addr: "10.0.0.5:3000".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().starts_with("connect to 10.0.0.5:3000 failed"));
        assert!(err.diagnostic_text().is_none());
    }

    #[test]
    fn ftp_rejection_names_step_and_code() {
        let err = AlphaJetError::FtpRejected {
            step: "login".into(),
            code: 530,
            message: "Login incorrect.".into(),
        };
        assert_eq!(
            err.to_string(),
            "FTP server rejected login with 530: Login incorrect."
        );
    }
}
