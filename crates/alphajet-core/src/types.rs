// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared domain types for the alphaJET client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fields of a parsed GP response: child tag name of the `GP` root mapped to
/// its text content (empty string when the element has no text).
pub type GpFields = HashMap<String, String>;

/// How raw response bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseDecoding {
    /// Keep ASCII bytes, silently drop everything else. Printer firmware is
    /// known to emit stray high bytes around responses.
    #[default]
    Lossy,
    /// Fail the call on the first non-ASCII byte.
    Strict,
}

/// Whether a file transfer session is upgraded to TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Plain FTP.
    #[default]
    Plain,
    /// Explicit FTPS: control and data channels protected.
    Secure,
}

impl TransferMode {
    pub fn from_secure_flag(secure: bool) -> Self {
        if secure { Self::Secure } else { Self::Plain }
    }
}

/// Error classification used by the caller-level retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip, timeout, garbage from a rebooting device.
    Transient,
    /// Somebody has to fix a local file, path or permission.
    UserAction,
    /// Retrying will never help.
    Permanent,
}
