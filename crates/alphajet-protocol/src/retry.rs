// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy with exponential backoff + jitter for callers of the GP and
// FTP clients.
//
// Neither client retries on its own; a caller that wants retries wraps the
// call in `retry_async`.  Only transient errors are retried.

use std::future::Future;
use std::time::Duration;

use alphajet_core::error::{AlphaJetError, Result};
use alphajet_core::types::ErrorClass;
use tracing::{debug, info, warn};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry: the error is permanent or needs a person.
    GiveUp(ErrorClass),
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify an `AlphaJetError` for retry decisions.
pub fn classify_error(err: &AlphaJetError) -> ErrorClass {
    match err {
        // Network trouble and garbage from a device that is still booting.
        AlphaJetError::ConnectFailed { .. }
        | AlphaJetError::SendFailed { .. }
        | AlphaJetError::ReceiveFailed { .. }
        | AlphaJetError::EnvelopeNotFound { .. }
        | AlphaJetError::MalformedXml { .. }
        | AlphaJetError::Transfer(_)
        | AlphaJetError::IntegrityMismatch { .. } => ErrorClass::Transient,

        AlphaJetError::FtpRejected { code, .. } => classify_ftp_reply(*code),

        AlphaJetError::ResponseTooLarge { .. } | AlphaJetError::Config(_) => {
            ErrorClass::UserAction
        }

        AlphaJetError::InvalidEncoding { .. }
        | AlphaJetError::InvalidCommand(_)
        | AlphaJetError::Serialization(_) => ErrorClass::Permanent,

        AlphaJetError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                ErrorClass::UserAction
            }
            _ => ErrorClass::Transient,
        },
    }
}

/// Classify an FTP rejection by its reply code.
///
/// 5xx replies (bad credentials, missing path, no space) repeat until
/// someone fixes the cause; 4xx and out-of-sequence replies may clear up.
fn classify_ftp_reply(code: u32) -> ErrorClass {
    match code {
        500..=599 => ErrorClass::UserAction,
        _ => ErrorClass::Transient,
    }
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &AlphaJetError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            info!("permanent error, not retrying");
            RetryDecision::GiveUp(ErrorClass::Permanent)
        }
        ErrorClass::UserAction => {
            info!("user action required, not retrying");
            RetryDecision::GiveUp(ErrorClass::UserAction)
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// Run `op` until it succeeds or `should_retry` says stop; the last error is
/// returned unchanged.
pub async fn retry_async<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => match should_retry(&err, attempt, config) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(attempt, error = %err, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp(_) | RetryDecision::Exhausted => return Err(err),
            },
        }
    }
}

/// Exponential backoff with jitter:
///
/// delay = min(base * 2^attempt + jitter, max_delay), jitter in [0, base).
fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
    let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
    let capped_ms = total_ms.min(config.max_delay.as_millis() as u64);

    Duration::from_millis(capped_ms)
}

/// Deterministic spread derived from the attempt number.
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64).wrapping_mul(6364136223846793005);
    hash % base_ms.max(1)
}
