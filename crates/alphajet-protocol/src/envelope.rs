// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GP envelope framing.
//
// Every command travels as `<GP>...</GP>\r\n` in plain ASCII.  Callers may
// pass either the bare body (`<STATUS/>`) or an already wrapped command.

use alphajet_core::error::{AlphaJetError, Result};

/// Envelope tag name.
pub const ENVELOPE_TAG: &str = "GP";

/// Opening envelope tag as sent on the wire.
pub const OPEN_TAG: &str = "<GP>";

/// Closing envelope tag.
pub const CLOSE_TAG: &str = "</GP>";

/// Prefix of the opening tag searched for in replies (the printer may add
/// attributes to the root element).
pub const OPEN_PREFIX: &str = "<GP";

/// Line terminator that ends every outbound frame.
pub const FRAME_TERMINATOR: &[u8] = b"\r\n";

/// Status query body.
pub const STATUS_QUERY: &str = "<STATUS/>";

/// Trim `body` and wrap it in the envelope unless it already starts with the
/// opening tag.  Idempotent.
pub fn normalize(body: &str) -> String {
    let body = body.trim();
    if body.starts_with(OPEN_TAG) {
        body.to_string()
    } else {
        format!("{OPEN_TAG}{body}{CLOSE_TAG}")
    }
}

/// Build the exact bytes written to the command port.
pub fn frame(body: &str) -> Result<Vec<u8>> {
    let normalized = normalize(body);
    if let Some((offset, ch)) = normalized.char_indices().find(|(_, c)| !c.is_ascii()) {
        return Err(AlphaJetError::InvalidCommand(format!(
            "non-ASCII character {ch:?} at offset {offset}"
        )));
    }

    let mut payload = Vec::with_capacity(normalized.len() + FRAME_TERMINATOR.len());
    payload.extend_from_slice(normalized.as_bytes());
    payload.extend_from_slice(FRAME_TERMINATOR);
    Ok(payload)
}
