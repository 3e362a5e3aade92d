// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// alphaJET file transfer — label templates up, logs down, over FTP or
// explicit FTPS on the printer's file port.

pub mod ftp_client;
pub mod integrity;

pub use ftp_client::{FtpClient, TransferReport};
