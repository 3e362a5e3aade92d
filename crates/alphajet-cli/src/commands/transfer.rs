// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File transfer commands.

use std::path::Path;

use alphajet_core::config::ClientConfig;
use alphajet_core::error::Result;
use alphajet_core::types::TransferMode;
use alphajet_ftp::{FtpClient, TransferReport};

pub async fn upload(
    config: &ClientConfig,
    local: &Path,
    remote_dir: &str,
    secure: bool,
) -> Result<()> {
    let client = FtpClient::new(config.endpoint.clone());
    let report = client
        .upload(local, remote_dir, TransferMode::from_secure_flag(secure))
        .await?;
    println!("{}", summarize("uploaded", &report));
    Ok(())
}

pub async fn download(
    config: &ClientConfig,
    remote: &str,
    local_dir: &Path,
    secure: bool,
    expected_sha256: Option<&str>,
) -> Result<()> {
    let client = FtpClient::new(config.endpoint.clone());
    let report = client
        .download(
            remote,
            local_dir,
            TransferMode::from_secure_flag(secure),
            expected_sha256,
        )
        .await?;
    println!("{}", summarize("downloaded", &report));
    Ok(())
}

fn summarize(verb: &str, report: &TransferReport) -> String {
    format!(
        "{verb} {} <-> {} ({} bytes, sha256 {})",
        report.local_path.display(),
        report.remote_path,
        report.bytes,
        report.sha256
    )
}
