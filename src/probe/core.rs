//! Core probe abstractions
//!
//! The evaluator talks to the network only through [`Transport`] and reads
//! time only through [`Clock`], so both can be swapped (reqwest in production,
//! scripted doubles in tests) without touching the classification rules.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Connection-establishment budget
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Response-read budget
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(300);

/// Slowest end-to-end response still counted as UP (inclusive)
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(500);

/// Timeouts and the latency threshold applied to every probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub latency_threshold: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            latency_threshold: DEFAULT_LATENCY_THRESHOLD,
        }
    }
}

/// A fully built probe request
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// What the transport observed once the response was fully read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body_len: usize,
}

/// Cause classification for a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    ConnectTimeout,
    ReadTimeout,
    ConnectionRefused,
    Dns,
    Tls,
    Connect,
    Protocol,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::ConnectTimeout => "connect_timeout",
            TransportErrorKind::ReadTimeout => "read_timeout",
            TransportErrorKind::ConnectionRefused => "connection_refused",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Protocol => "protocol",
            TransportErrorKind::Other => "other",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportErrorKind::ConnectTimeout | TransportErrorKind::ReadTimeout
        )
    }
}

/// A request that never produced a complete response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} error: {message}", .kind.as_str())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
];

const TLS_MARKERS: &[&str] = &[
    "certificate",
    "tls",
    "ssl",
    "handshake",
    "corrupt message",
];

/// Classify an error by walking its `source()` chain.
///
/// Returns `None` when nothing in the chain is recognisable; the caller
/// falls back on whatever its HTTP library reports. `connecting` marks
/// errors raised while the connection (including TLS) was being set up.
pub fn classify_error_chain(
    err: &(dyn std::error::Error + 'static),
    connecting: bool,
) -> Option<TransportErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    let mut by_message = None;

    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return Some(TransportErrorKind::ConnectionRefused)
                }
                io::ErrorKind::TimedOut => {
                    return Some(if connecting {
                        TransportErrorKind::ConnectTimeout
                    } else {
                        TransportErrorKind::ReadTimeout
                    })
                }
                io::ErrorKind::InvalidData if connecting => {
                    return Some(TransportErrorKind::Tls)
                }
                _ => {}
            }
        }

        if by_message.is_none() {
            let text = e.to_string().to_lowercase();
            if DNS_MARKERS.iter().any(|m| text.contains(m)) {
                by_message = Some(TransportErrorKind::Dns);
            } else if TLS_MARKERS.iter().any(|m| text.contains(m)) {
                by_message = Some(TransportErrorKind::Tls);
            }
        }

        current = e.source();
    }

    by_message
}

/// Sends one probe request and reads the complete response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, TransportError>;

    fn implementation_name(&self) -> &'static str;
}

/// Monotonic time source used to measure probe latency
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
