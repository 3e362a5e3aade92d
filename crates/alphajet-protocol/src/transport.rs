// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// GP command transport over TCP (command port, 3000 by default).
//
// Strictly request-then-response: one connection per command, the whole
// frame is written before anything is read.  The printer neither prefixes
// its reply with a length nor terminates it, so the reply ends when the
// peer closes the connection or when a read sits idle for the configured
// timeout.  That idle timeout is the normal end of a response, not a
// failure.
//
// The stream is an owned local; every return path (including `?`) drops
// and thereby closes it.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

use alphajet_core::config::ClientConfig;
use alphajet_core::error::{AlphaJetError, Result};
use alphajet_core::types::{GpFields, ResponseDecoding};

use crate::envelope;
use crate::extract;

/// Size of each receive call.
const RECV_CHUNK: usize = 4096;

/// Timeout for [`GpClient::probe`].
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens the byte stream a command travels over.
///
/// Production code uses [`TcpConnector`]; tests substitute doubles that
/// observe how streams are opened and closed.
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    fn connect(&self, addr: &str) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, addr: &str) -> impl Future<Output = io::Result<TcpStream>> + Send {
        TcpStream::connect(addr.to_string())
    }
}

/// Client for the printer's GP command port.
///
/// Holds only immutable configuration; share it freely.  Concurrent calls
/// each open their own connection (the printer itself may refuse a second
/// one).
pub struct GpClient<C = TcpConnector> {
    config: ClientConfig,
    connector: C,
}

impl GpClient<TcpConnector> {
    /// Create a client talking plain TCP to `config.endpoint`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> GpClient<C> {
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send one GP command and return the decoded raw response, noise
    /// included.
    ///
    /// `timeout` bounds the connect, the send, and every individual receive.
    /// A receive that times out ends the response.
    #[instrument(skip(self, body), fields(addr = %self.config.endpoint.command_addr()))]
    pub async fn send_command(&self, body: &str, timeout: Duration) -> Result<String> {
        let payload = envelope::frame(body)?;
        let addr = self.config.endpoint.command_addr();

        let mut stream = self.open(&addr, timeout).await?;

        debug!(bytes = payload.len(), "sending GP frame");
        let sent = tokio::time::timeout(timeout, async {
            stream.write_all(&payload).await?;
            stream.flush().await
        })
        .await;
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(source)) => return Err(AlphaJetError::SendFailed { addr, source }),
            Err(_) => {
                return Err(AlphaJetError::SendFailed {
                    addr,
                    source: timed_out("send", timeout),
                });
            }
        }

        let buffer = read_until_idle(
            &mut stream,
            &addr,
            timeout,
            self.config.max_response_bytes,
        )
        .await?;
        drop(stream);

        info!(bytes = buffer.len(), "GP response received");
        decode_response(&buffer, self.config.decoding)
    }

    /// Send a command with the configured timeout and extract its fields.
    pub async fn query(&self, body: &str) -> Result<GpFields> {
        let raw = self.send_command(body, self.config.command_timeout()).await?;
        extract::parse_response(&raw)
    }

    /// Query the printer status (`<STATUS/>`).
    pub async fn status(&self) -> Result<GpFields> {
        self.query(envelope::STATUS_QUERY).await
    }

    /// Check that the command port accepts connections.  Nothing is sent.
    #[instrument(skip(self), fields(addr = %self.config.endpoint.command_addr()))]
    pub async fn probe(&self, timeout: Duration) -> Result<()> {
        let addr = self.config.endpoint.command_addr();
        let stream = self.open(&addr, timeout).await?;
        drop(stream);
        debug!("command port reachable");
        Ok(())
    }

    async fn open(&self, addr: &str, timeout: Duration) -> Result<C::Stream> {
        debug!(timeout_ms = timeout.as_millis() as u64, "connecting to GP port");
        match tokio::time::timeout(timeout, self.connector.connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => {
                warn!(error = %source, "GP connect failed");
                Err(AlphaJetError::ConnectFailed {
                    addr: addr.to_string(),
                    source,
                })
            }
            Err(_) => {
                warn!("GP connect timed out");
                Err(AlphaJetError::ConnectFailed {
                    addr: addr.to_string(),
                    source: timed_out("connect", timeout),
                })
            }
        }
    }
}

/// Read until the peer closes or a single read stays idle for `timeout`.
async fn read_until_idle<S: AsyncRead + Unpin>(
    stream: &mut S,
    addr: &str,
    timeout: Duration,
    limit: usize,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; RECV_CHUNK];

    loop {
        match tokio::time::timeout(timeout, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                debug!(total = buffer.len(), "peer closed connection");
                break;
            }
            Ok(Ok(n)) => {
                if buffer.len() + n > limit {
                    warn!(limit, "GP response exceeded size limit");
                    return Err(AlphaJetError::ResponseTooLarge { limit });
                }
                buffer.extend_from_slice(&chunk[..n]);
                debug!(read = n, total = buffer.len(), "GP response chunk");
            }
            Ok(Err(source)) => {
                return Err(AlphaJetError::ReceiveFailed {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                debug!(total = buffer.len(), "receive idle, treating as end of response");
                break;
            }
        }
    }

    Ok(buffer)
}

/// Turn collected bytes into text according to `decoding`.
///
/// Lossy decoding keeps every ASCII byte (NUL included) and drops the rest.
pub fn decode_response(bytes: &[u8], decoding: ResponseDecoding) -> Result<String> {
    match decoding {
        ResponseDecoding::Lossy => {
            let text: String = bytes
                .iter()
                .filter(|b| b.is_ascii())
                .map(|&b| char::from(b))
                .collect();
            let dropped = bytes.len() - text.len();
            if dropped > 0 {
                debug!(dropped, "dropped non-ASCII bytes from GP response");
            }
            Ok(text)
        }
        ResponseDecoding::Strict => {
            if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
                return Err(AlphaJetError::InvalidEncoding {
                    offset,
                    byte: bytes[offset],
                });
            }
            Ok(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

fn timed_out(what: &str, timeout: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{what} timed out after {}ms", timeout.as_millis()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use std::time::Instant;

    use tokio::io::ReadBuf;
    use tokio::net::TcpListener;

    use alphajet_core::config::Endpoint;

    const SHORT: Duration = Duration::from_millis(200);

    fn config_for(port: u16) -> ClientConfig {
        ClientConfig {
            endpoint: Endpoint {
                host: "127.0.0.1".into(),
                command_port: port,
                ..Endpoint::default()
            },
            command_timeout_ms: SHORT.as_millis() as u64,
            ..ClientConfig::default()
        }
    }

    /// Accept one connection, read one frame, answer with `reply`, then
    /// either close or hold the connection open. Returns the received frame.
    async fn serve_once(
        reply: &'static [u8],
        close_after_reply: bool,
    ) -> (u16, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut frame = Vec::new();
            let mut byte = [0u8; 1];
            while !frame.ends_with(b"\r\n") {
                if socket.read(&mut byte).await.unwrap() == 0 {
                    break;
                }
                frame.push(byte[0]);
            }
            // Reply in two fragments.
            let (head, tail) = reply.split_at(reply.len() / 2);
            socket.write_all(head).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            socket.write_all(tail).await.unwrap();
            if !close_after_reply {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            frame
        });
        (port, handle)
    }

    /// Port that is known to refuse connections.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn status_frame_and_reply_until_close() {
        let (port, server) = serve_once(b"HELLO<GP><STATE>READY</STATE></GP>\r\n", true).await;
        let client = GpClient::new(config_for(port));

        let raw = client.send_command("<STATUS/>", SHORT).await.unwrap();
        assert_eq!(raw, "HELLO<GP><STATE>READY</STATE></GP>\r\n");
        assert_eq!(server.await.unwrap(), b"<GP><STATUS/></GP>\r\n");
    }

    #[tokio::test]
    async fn idle_timeout_ends_response() {
        let (port, _server) = serve_once(b"<GP><INK>40</INK></GP>", false).await;
        let client = GpClient::new(config_for(port));

        let started = Instant::now();
        let fields = client.query("<STATUS/>").await.unwrap();
        assert_eq!(fields.get("INK").map(String::as_str), Some("40"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn already_wrapped_body_is_sent_once() {
        let (port, server) = serve_once(b"<GP></GP>", true).await;
        let client = GpClient::new(config_for(port));

        client.send_command("  <GP><STATUS/></GP>  ", SHORT).await.unwrap();
        assert_eq!(server.await.unwrap(), b"<GP><STATUS/></GP>\r\n");
    }

    #[tokio::test]
    async fn refused_connect_is_connect_failed() {
        let port = closed_port().await;
        let client = GpClient::new(config_for(port));

        let err = client.send_command("<STATUS/>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::ConnectFailed { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_fails_within_timeout() {
        let mut config = config_for(3000);
        // TEST-NET-1, never routed.
        config.endpoint.host = "192.0.2.1".into();
        let client = GpClient::new(config);

        let started = Instant::now();
        let err = client.send_command("<STATUS/>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::ConnectFailed { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn non_ascii_command_never_connects() {
        let counter = CountingConnector::default();
        let client = GpClient::with_connector(config_for(1), counter.clone());

        let err = client.send_command("<TEXT>€</TEXT>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::InvalidCommand(_)));
        assert_eq!(counter.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn probe_reports_reachability() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let up = GpClient::new(config_for(port));
        assert!(up.probe(PROBE_TIMEOUT).await.is_ok());

        let down = GpClient::new(config_for(closed_port().await));
        assert!(matches!(
            down.probe(PROBE_TIMEOUT).await.unwrap_err(),
            AlphaJetError::ConnectFailed { .. }
        ));
    }

    #[test]
    fn lossy_decoding_drops_high_bytes() {
        let raw = decode_response(b"\xff<GP><A>1</A></GP>\x80\x00", ResponseDecoding::Lossy).unwrap();
        assert_eq!(raw, "<GP><A>1</A></GP>\x00");
    }

    #[test]
    fn strict_decoding_rejects_high_bytes() {
        let err = decode_response(b"<GP>\xe9</GP>", ResponseDecoding::Strict).unwrap_err();
        assert!(matches!(
            err,
            AlphaJetError::InvalidEncoding { offset: 4, byte: 0xe9 }
        ));
    }

    // -- Stream lifecycle ----------------------------------------------------

    /// Scripted in-memory stream that records its own drop.
    struct ScriptedStream {
        reply: Vec<u8>,
        pos: usize,
        /// Stall forever once the reply is exhausted instead of reporting EOF.
        stall: bool,
        fail_write: bool,
        written: Arc<std::sync::Mutex<Vec<u8>>>,
        closed: Arc<AtomicUsize>,
    }

    impl Drop for ScriptedStream {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AsyncRead for ScriptedStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.pos >= self.reply.len() {
                return if self.stall {
                    Poll::Pending
                } else {
                    Poll::Ready(Ok(()))
                };
            }
            let n = buf.remaining().min(self.reply.len() - self.pos).min(7);
            let start = self.pos;
            buf.put_slice(&self.reply[start..start + n]);
            self.pos += n;
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for ScriptedStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            data: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.fail_write {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            self.written.lock().unwrap().extend_from_slice(data);
            Poll::Ready(Ok(data.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Clone, Default)]
    struct CountingConnector {
        reply: Vec<u8>,
        stall: bool,
        fail_write: bool,
        refuse: bool,
        written: Arc<std::sync::Mutex<Vec<u8>>>,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl Connector for CountingConnector {
        type Stream = ScriptedStream;

        fn connect(&self, _addr: &str) -> impl Future<Output = io::Result<ScriptedStream>> + Send {
            let this = self.clone();
            async move {
                if this.refuse {
                    return Err(io::ErrorKind::ConnectionRefused.into());
                }
                this.opened.fetch_add(1, Ordering::SeqCst);
                Ok(ScriptedStream {
                    reply: this.reply,
                    pos: 0,
                    stall: this.stall,
                    fail_write: this.fail_write,
                    written: this.written,
                    closed: this.closed,
                })
            }
        }
    }

    impl CountingConnector {
        fn counts(&self) -> (usize, usize) {
            (
                self.opened.load(Ordering::SeqCst),
                self.closed.load(Ordering::SeqCst),
            )
        }
    }

    #[tokio::test]
    async fn stream_closed_once_after_peer_close() {
        let connector = CountingConnector {
            reply: b"\x00<GP><STATE>READY</STATE></GP>".to_vec(),
            ..Default::default()
        };
        let client = GpClient::with_connector(config_for(1), connector.clone());

        let fields = client.query("<STATUS/>").await.unwrap();
        assert_eq!(fields.get("STATE").map(String::as_str), Some("READY"));
        assert_eq!(connector.counts(), (1, 1));
        assert_eq!(&*connector.written.lock().unwrap(), b"<GP><STATUS/></GP>\r\n");
    }

    #[tokio::test]
    async fn stream_closed_once_after_idle_timeout() {
        let connector = CountingConnector {
            reply: b"<GP><A>1</A></GP>".to_vec(),
            stall: true,
            ..Default::default()
        };
        let client = GpClient::with_connector(config_for(1), connector.clone());

        let raw = client.send_command("<STATUS/>", SHORT).await.unwrap();
        assert_eq!(raw, "<GP><A>1</A></GP>");
        assert_eq!(connector.counts(), (1, 1));
    }

    #[tokio::test]
    async fn stream_closed_once_after_send_failure() {
        let connector = CountingConnector {
            fail_write: true,
            ..Default::default()
        };
        let client = GpClient::with_connector(config_for(1), connector.clone());

        let err = client.send_command("<STATUS/>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::SendFailed { .. }));
        assert_eq!(connector.counts(), (1, 1));
    }

    #[tokio::test]
    async fn stream_closed_once_after_oversized_reply() {
        let mut config = config_for(1);
        config.max_response_bytes = 16;
        let connector = CountingConnector {
            reply: vec![b'x'; 64],
            ..Default::default()
        };
        let client = GpClient::with_connector(config, connector.clone());

        let err = client.send_command("<STATUS/>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::ResponseTooLarge { limit: 16 }));
        assert_eq!(connector.counts(), (1, 1));
    }

    #[tokio::test]
    async fn extraction_failure_still_closes_stream() {
        let connector = CountingConnector {
            reply: b"NAK\r\n".to_vec(),
            ..Default::default()
        };
        let client = GpClient::with_connector(config_for(1), connector.clone());

        let err = client.query("<STATUS/>").await.unwrap_err();
        assert_eq!(err.diagnostic_text(), Some("NAK\r\n"));
        assert_eq!(connector.counts(), (1, 1));
    }

    #[tokio::test]
    async fn refused_connect_opens_nothing() {
        let connector = CountingConnector {
            refuse: true,
            ..Default::default()
        };
        let client = GpClient::with_connector(config_for(1), connector.clone());

        let err = client.send_command("<STATUS/>", SHORT).await.unwrap_err();
        assert!(matches!(err, AlphaJetError::ConnectFailed { .. }));
        assert_eq!(connector.counts(), (0, 0));
    }
}
