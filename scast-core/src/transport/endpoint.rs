//! Where to connect, and how.
//!
//! The sender never calls `TcpStream::connect` directly; it goes through a
//! [`Connector`] so the reconnect loop can be driven by a scripted
//! connector in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::ScastError;

// ── Endpoint ─────────────────────────────────────────────────────

/// A host and port pair, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse `host:port`. The port is taken after the last colon so bare
    /// IPv6 literals in brackets (`[::1]:6666`) work.
    pub fn parse(s: &str) -> Result<Self, ScastError> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ScastError::Config(format!("missing port in address {s:?}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| ScastError::Config(format!("invalid port in {s:?}: {e}")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ScastError::Config(format!("missing host in address {s:?}")));
        }
        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// ── Connector ────────────────────────────────────────────────────

/// Opens one duplex stream per call.
#[async_trait]
pub trait Connector: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Attempt a single connection.
    async fn connect(&mut self) -> Result<Self::Stream, ScastError>;

    /// Human-readable description of the peer, for logs.
    fn peer(&self) -> String;
}

/// Plain TCP connector with a per-attempt timeout.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    endpoint: Endpoint,
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self) -> Result<TcpStream, ScastError> {
        let addr = (self.endpoint.host(), self.endpoint.port());
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ScastError::Timeout(self.timeout))?
            .map_err(|source| ScastError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        debug!(local = ?stream.local_addr().ok(), "tcp connected to {}", self.endpoint);
        Ok(stream)
    }

    fn peer(&self) -> String {
        self.endpoint.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_port() {
        let ep = Endpoint::parse("localhost:6666").unwrap();
        assert_eq!(ep.host(), "localhost");
        assert_eq!(ep.port(), 6666);
        assert_eq!(ep.to_string(), "localhost:6666");
    }

    #[test]
    fn parse_ipv6_literal() {
        let ep = Endpoint::parse("[::1]:7000").unwrap();
        assert_eq!(ep.host(), "::1");
        assert_eq!(ep.to_string(), "[::1]:7000");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Endpoint::parse("localhost").is_err());
        assert!(Endpoint::parse("localhost:http").is_err());
        assert!(Endpoint::parse(":80").is_err());
    }

    #[tokio::test]
    async fn tcp_connector_reports_refusal() {
        // Grab a free port, then close the listener so nothing is there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut connector =
            TcpConnector::new(Endpoint::new("127.0.0.1", port), Duration::from_secs(2));
        let err = connector.connect().await.unwrap_err();
        assert!(err.is_connection_loss());
    }

    #[tokio::test]
    async fn tcp_connector_connects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut connector =
            TcpConnector::new(Endpoint::new("127.0.0.1", port), Duration::from_secs(2));
        let (client, accepted) = tokio::join!(connector.connect(), listener.accept());
        let client = client.unwrap();
        let (_, peer) = accepted.unwrap();
        assert_eq!(client.local_addr().unwrap(), peer);
        assert!(client.nodelay().unwrap());
    }
}
