// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// alphaJET GP protocol — command framing, TCP transport, and extraction of
// the `<GP>` reply from whatever the printer sends back.  The transport knows
// nothing about the reply schema and the extractor knows nothing about
// sockets; `GpClient::query` is the only place they meet.

pub mod envelope;
pub mod extract;
pub mod retry;
pub mod transport;

pub use extract::parse_response;
pub use transport::{Connector, GpClient, TcpConnector};
