// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// FTP client for the printer's file port (21 by default).
//
// Label templates go up into a remote directory, logs come down into a
// local one.  Secure mode upgrades the control connection with AUTH TLS
// before logging in and protects the data channel; the handshake itself is
// entirely suppaftp's business.
//
// suppaftp is blocking, so each session runs on the blocking pool and the
// public API stays async like the GP client.  Every socket of a session
// carries a read/write timeout; a file port that accepts and then goes
// silent fails instead of hanging.

use std::io::Cursor;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, NativeTlsConnector, NativeTlsFtpStream};
use tracing::{debug, info, instrument, warn};

use alphajet_core::config::Endpoint;
use alphajet_core::error::{AlphaJetError, Result};
use alphajet_core::types::TransferMode;

use crate::integrity::{hash_bytes, verify_hash};

/// Timeout for establishing the FTP control connection.
const FTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read/write timeout on the control and data connections.
const FTP_IO_TIMEOUT_SECS: u64 = 30;

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// File on this machine (source of an upload, target of a download).
    pub local_path: PathBuf,
    /// Path on the printer.
    pub remote_path: String,
    /// Number of bytes transferred.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the transferred content.
    pub sha256: String,
}

/// FTP client bound to one printer endpoint.
#[derive(Debug, Clone)]
pub struct FtpClient {
    endpoint: Endpoint,
    io_timeout: Duration,
}

impl FtpClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            io_timeout: Duration::from_secs(FTP_IO_TIMEOUT_SECS),
        }
    }

    /// Replace the per-read/per-write socket timeout.
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Upload `local_path` into `remote_dir`, keeping its file name.
    #[instrument(skip(self), fields(addr = %self.endpoint.file_addr()))]
    pub async fn upload(
        &self,
        local_path: &Path,
        remote_dir: &str,
        mode: TransferMode,
    ) -> Result<TransferReport> {
        let session = self.session(mode);
        let local_path = local_path.to_path_buf();
        let remote_dir = remote_dir.to_string();
        run_blocking(move || upload_blocking(&session, &local_path, &remote_dir)).await
    }

    /// Download `remote_filename` into `local_dir`, named after the last
    /// path component of the remote name.
    ///
    /// With `expected_sha256` the content is checked before anything is
    /// written, so a mismatch leaves `local_dir` untouched.
    #[instrument(skip(self), fields(addr = %self.endpoint.file_addr()))]
    pub async fn download(
        &self,
        remote_filename: &str,
        local_dir: &Path,
        mode: TransferMode,
        expected_sha256: Option<&str>,
    ) -> Result<TransferReport> {
        let session = self.session(mode);
        let remote_filename = remote_filename.to_string();
        let local_dir = local_dir.to_path_buf();
        let expected = expected_sha256.map(str::to_owned);
        run_blocking(move || {
            download_blocking(&session, &remote_filename, &local_dir, expected.as_deref())
        })
        .await
    }

    fn session(&self, mode: TransferMode) -> SessionParams {
        SessionParams {
            endpoint: self.endpoint.clone(),
            mode,
            io_timeout: self.io_timeout,
        }
    }
}

/// Everything a blocking session needs, moved onto the blocking pool.
struct SessionParams {
    endpoint: Endpoint,
    mode: TransferMode,
    io_timeout: Duration,
}

async fn run_blocking<F>(job: F) -> Result<TransferReport>
where
    F: FnOnce() -> Result<TransferReport> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AlphaJetError::Transfer(format!("transfer task failed: {e}")))?
}

fn upload_blocking(
    session: &SessionParams,
    local_path: &Path,
    remote_dir: &str,
) -> Result<TransferReport> {
    // Read before connecting so a bad local path never touches the printer.
    let filename = local_file_name(local_path)?;
    let data = std::fs::read(local_path)?;

    let mut ftp = open_session(session)?;
    ftp.cwd(remote_dir)
        .map_err(|e| ftp_error(&format!("CWD {remote_dir}"), e))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| ftp_error("TYPE I", e))?;

    let sent = ftp
        .put_file(filename, &mut Cursor::new(&data))
        .map_err(|e| ftp_error(&format!("STOR {filename}"), e))?;
    close_session(&mut ftp);

    let report = TransferReport {
        local_path: local_path.to_path_buf(),
        remote_path: remote_path(remote_dir, filename),
        bytes: sent,
        sha256: hash_bytes(&data),
    };
    info!(remote = %report.remote_path, bytes = report.bytes, "upload complete");
    Ok(report)
}

fn download_blocking(
    session: &SessionParams,
    remote_filename: &str,
    local_dir: &Path,
    expected_sha256: Option<&str>,
) -> Result<TransferReport> {
    let local_path = local_dir.join(remote_base_name(remote_filename)?);

    let mut ftp = open_session(session)?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| ftp_error("TYPE I", e))?;
    let data = ftp
        .retr_as_buffer(remote_filename)
        .map_err(|e| ftp_error(&format!("RETR {remote_filename}"), e))?
        .into_inner();
    close_session(&mut ftp);

    let sha256 = hash_bytes(&data);
    if let Some(expected) = expected_sha256 {
        verify_hash(&sha256, expected)?;
    }
    std::fs::write(&local_path, &data)?;

    let report = TransferReport {
        local_path,
        remote_path: remote_filename.to_string(),
        bytes: data.len() as u64,
        sha256,
    };
    info!(local = %report.local_path.display(), bytes = report.bytes, "download complete");
    Ok(report)
}

/// Connect, optionally upgrade to TLS, and log in.
fn open_session(session: &SessionParams) -> Result<NativeTlsFtpStream> {
    let endpoint = &session.endpoint;
    let addr = endpoint.file_addr();
    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|e| AlphaJetError::Transfer(format!("resolve {addr}: {e}")))?
        .next()
        .ok_or_else(|| AlphaJetError::Transfer(format!("resolve {addr}: no addresses")))?;

    debug!(addr = %addr, mode = ?session.mode, "connecting via FTP");
    // The greeting is read inside `connect_with_stream`, so the timeouts go
    // on the socket first.
    let control = TcpStream::connect_timeout(
        &socket_addr,
        Duration::from_secs(FTP_CONNECT_TIMEOUT_SECS),
    )
    .and_then(|stream| set_socket_timeouts(stream, session.io_timeout))
    .map_err(|e| AlphaJetError::Transfer(format!("connect {addr}: {e}")))?;

    let io_timeout = session.io_timeout;
    let ftp = NativeTlsFtpStream::connect_with_stream(control)
        .map_err(|e| ftp_error("greeting", e))?
        .passive_stream_builder(move |data_addr: SocketAddr| {
            TcpStream::connect_timeout(&data_addr, io_timeout)
                .and_then(|stream| set_socket_timeouts(stream, io_timeout))
                .map_err(FtpError::ConnectionError)
        });

    let mut ftp = match session.mode {
        TransferMode::Plain => ftp,
        TransferMode::Secure => {
            let tls = TlsConnector::new()
                .map_err(|e| AlphaJetError::Transfer(format!("TLS setup: {e}")))?;
            ftp.into_secure(NativeTlsConnector::from(tls), &endpoint.host)
                .map_err(|e| ftp_error("AUTH TLS", e))?
        }
    };

    ftp.login(endpoint.ftp_username.as_str(), endpoint.ftp_password.as_str())
        .map_err(|e| ftp_error("login", e))?;
    debug!(user = %endpoint.ftp_username, "FTP login accepted");
    Ok(ftp)
}

fn set_socket_timeouts(stream: TcpStream, timeout: Duration) -> std::io::Result<TcpStream> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

fn close_session(ftp: &mut NativeTlsFtpStream) {
    if let Err(e) = ftp.quit() {
        warn!(error = %e, "FTP QUIT failed; connection dropped anyway");
    }
}

/// Map a suppaftp failure at `step`.  A reply the server chose to send
/// keeps its code; everything else is a broken session.
fn ftp_error(step: &str, err: FtpError) -> AlphaJetError {
    match err {
        FtpError::UnexpectedResponse(reply) => {
            let code = reply.status.code();
            let text = String::from_utf8_lossy(&reply.body);
            let text = text.trim();
            let message = text
                .strip_prefix(code.to_string().as_str())
                .map(|rest| rest.trim_start_matches(['-', ' ']))
                .unwrap_or(text);
            AlphaJetError::FtpRejected {
                step: step.to_string(),
                code,
                message: message.to_string(),
            }
        }
        other => AlphaJetError::Transfer(format!("{step}: {other}")),
    }
}

/// File name of an upload source, which becomes the remote name.
fn local_file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            AlphaJetError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no UTF-8 file name", path.display()),
            ))
        })
}

/// Last `/`-separated component of a remote path.
fn remote_base_name(remote: &str) -> Result<&str> {
    match remote.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(AlphaJetError::Transfer(format!(
            "remote path {remote:?} does not name a file"
        ))),
    }
}

fn remote_path(remote_dir: &str, filename: &str) -> String {
    if remote_dir.ends_with('/') {
        format!("{remote_dir}{filename}")
    } else {
        format!("{remote_dir}/{filename}")
    }
}
