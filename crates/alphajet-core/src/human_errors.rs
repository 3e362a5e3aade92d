// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for line operators.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the calling layer presents it.

use crate::error::AlphaJetError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or timeout; worth trying again.
    Transient,
    /// Operator must do something (fix a path, a setting, a cable).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    /// Whether trying again may help.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert an `AlphaJetError` into a `HumanError`.
pub fn humanize_error(err: &AlphaJetError) -> HumanError {
    match err {
        AlphaJetError::ConnectFailed { addr, source } => humanize_connect_error(addr, source),

        AlphaJetError::SendFailed { .. } => HumanError {
            message: "The command couldn't be delivered to the printer.".into(),
            suggestion: "The connection dropped while sending. Check the network cable and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        AlphaJetError::ReceiveFailed { .. } => HumanError {
            message: "The printer's answer was cut off.".into(),
            suggestion: "The printer closed the connection abruptly. Try again in a few seconds.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        AlphaJetError::ResponseTooLarge { limit } => HumanError {
            message: "The printer kept sending data without stopping.".into(),
            suggestion: format!(
                "Check that the command port really belongs to the printer's GP interface, or raise max_response_bytes (currently {limit})."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        AlphaJetError::InvalidEncoding { .. } => HumanError {
            message: "The printer answered with unexpected characters.".into(),
            suggestion: "Switch the response decoding to \"lossy\" to ignore stray bytes.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        AlphaJetError::InvalidCommand(detail) => HumanError {
            message: "That command can't be sent to the printer.".into(),
            suggestion: format!("GP commands must be plain ASCII text. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        AlphaJetError::EnvelopeNotFound { .. } => HumanError {
            message: "The printer's answer didn't contain a GP reply.".into(),
            suggestion: "The printer may still be starting up. Wait a moment and try again, or raise the command timeout.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        AlphaJetError::MalformedXml { .. } => HumanError {
            message: "The printer's reply was garbled.".into(),
            suggestion: "Try again. If this keeps happening, capture the raw reply with `send --raw` and check the firmware version.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        AlphaJetError::Transfer(detail) => humanize_transfer_error(detail),

        AlphaJetError::FtpRejected { step, code, .. } => humanize_ftp_rejection(step, *code),

        AlphaJetError::IntegrityMismatch { .. } => HumanError {
            message: "The transferred file doesn't match the expected checksum.".into(),
            suggestion: "The copy may have been damaged in transit. Transfer it again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        AlphaJetError::Config(detail) => HumanError {
            message: "The printer settings are incomplete.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        AlphaJetError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied for that file or folder.".into(),
                    suggestion: "Check the file permissions, or choose a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        AlphaJetError::Serialization(_) => HumanError {
            message: "The configuration file couldn't be read.".into(),
            suggestion: "Make sure it is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_connect_error(addr: &str, source: &std::io::Error) -> HumanError {
    match source.kind() {
        std::io::ErrorKind::TimedOut => HumanError {
            message: "The printer didn't respond in time.".into(),
            suggestion: format!("Check that the printer at {addr} is switched on and on the same network."),
            retriable: true,
            severity: Severity::Transient,
        },
        std::io::ErrorKind::ConnectionRefused => HumanError {
            message: "The printer refused our connection.".into(),
            suggestion: format!("The GP interface at {addr} may be disabled, or another client is already connected."),
            retriable: true,
            severity: Severity::Transient,
        },
        _ => HumanError {
            message: "We couldn't reach the printer.".into(),
            suggestion: format!("Check the printer address ({addr}) and the network connection."),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_ftp_rejection(step: &str, code: u32) -> HumanError {
    match code {
        530 => HumanError {
            message: "The printer rejected the FTP login.".into(),
            suggestion: "Check the FTP username and password in the configuration.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        550 => HumanError {
            message: "The printer couldn't find that file or folder.".into(),
            suggestion: "Check the remote path and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        400..=499 => HumanError {
            message: "The printer is busy and couldn't take the file transfer.".into(),
            suggestion: format!("Try again in a few seconds. (FTP reply {code} to {step})"),
            retriable: true,
            severity: Severity::Transient,
        },
        _ => HumanError {
            message: "The printer refused the file transfer.".into(),
            suggestion: format!("Check the file name and the printer's free space. (FTP reply {code} to {step})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_transfer_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("tls") || lower.contains("certificate") {
        HumanError {
            message: "The secure file transfer couldn't be set up.".into(),
            suggestion: "Try again without the secure option if the printer doesn't support FTPS.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "The file transfer failed.".into(),
            suggestion: format!("Try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
