// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transfer integrity — SHA-256 digests of uploaded and downloaded files.

use alphajet_core::error::AlphaJetError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compare a computed digest against the one the operator expects.
///
/// The expected value is matched case-insensitively since checksums are
/// often copied from tools that print upper-case hex.
pub fn verify_hash(actual_hex: &str, expected_hex: &str) -> Result<(), AlphaJetError> {
    if actual_hex.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(AlphaJetError::IntegrityMismatch {
            expected: expected_hex.trim().to_owned(),
            actual: actual_hex.to_owned(),
        })
    }
}
