// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GP commands: status, send, parse, probe.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use tracing::info;

use alphajet_core::config::ClientConfig;
use alphajet_core::error::Result;
use alphajet_core::types::{GpFields, ResponseDecoding};
use alphajet_protocol::envelope::STATUS_QUERY;
use alphajet_protocol::retry::{RetryConfig, retry_async};
use alphajet_protocol::transport::{PROBE_TIMEOUT, decode_response};
use alphajet_protocol::{GpClient, parse_response};

pub async fn status(config: &ClientConfig, retries: u32, json: bool) -> Result<()> {
    let client = GpClient::new(config.clone());
    let fields = with_retries(retries, || client.query(STATUS_QUERY)).await?;
    println!("{}", render_fields(&fields, json)?);
    Ok(())
}

pub async fn send(
    config: &ClientConfig,
    body: &str,
    raw: bool,
    retries: u32,
    json: bool,
) -> Result<()> {
    let client = GpClient::new(config.clone());
    if raw {
        let timeout = config.command_timeout();
        let text = with_retries(retries, || client.send_command(body, timeout)).await?;
        println!("{}", text.escape_debug());
    } else {
        let fields = with_retries(retries, || client.query(body)).await?;
        println!("{}", render_fields(&fields, json)?);
    }
    Ok(())
}

/// Run the extractor over a captured response. Bytes are decoded the same
/// lossy way the transport decodes them.
pub fn parse(file: Option<&Path>, json: bool) -> Result<()> {
    let bytes = match file {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    let raw = decode_response(&bytes, ResponseDecoding::Lossy)?;
    let fields = parse_response(&raw)?;
    println!("{}", render_fields(&fields, json)?);
    Ok(())
}

pub async fn probe(config: &ClientConfig) -> Result<()> {
    let client = GpClient::new(config.clone());
    client.probe(PROBE_TIMEOUT).await?;
    info!(addr = %config.endpoint.command_addr(), "printer reachable");
    println!("connected: {}", config.endpoint.command_addr());
    Ok(())
}

async fn with_retries<T, F, Fut>(retries: u32, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let policy = RetryConfig {
        max_retries: retries,
        ..RetryConfig::default()
    };
    retry_async(&policy, op).await
}

/// Fields sorted by tag name, either as `TAG: value` lines or as a JSON
/// object.
pub fn render_fields(fields: &GpFields, json: bool) -> Result<String> {
    let sorted: BTreeMap<&str, &str> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&sorted)?);
    }

    Ok(sorted
        .iter()
        .map(|(tag, value)| format!("{tag}: {value}"))
        .collect::<Vec<_>>()
        .join("\n"))
}
