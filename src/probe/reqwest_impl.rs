//! Reqwest-based probe transport

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::Result;
use crate::probe::core::{
    classify_error_chain, ProbePolicy, ProbeRequest, ProbeResponse, Transport, TransportError,
    TransportErrorKind,
};

/// Transport backed by a shared `reqwest::Client`.
///
/// Redirects are never followed: a 3xx is itself the answer. The client's
/// connection pool is shared across probes purely as an optimisation.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    /// Backstop against responses that trickle in without ever tripping
    /// the per-read timeout.
    deadline: Duration,
}

/// Hard cap on one exchange.
///
/// Always past both the latency threshold and the connect+read budgets, so
/// a response that completes late is still judged against the threshold.
pub fn exchange_deadline(policy: &ProbePolicy) -> Duration {
    policy
        .latency_threshold
        .max(policy.connect_timeout + policy.read_timeout)
        + policy.read_timeout
}

impl ReqwestTransport {
    pub fn new(policy: &ProbePolicy) -> Result<Self> {
        info!("🚀 Initializing Reqwest probe transport");
        info!("   Connect timeout: {}ms", policy.connect_timeout.as_millis());
        info!("   Read timeout: {}ms", policy.read_timeout.as_millis());
        info!("   Latency threshold: {}ms", policy.latency_threshold.as_millis());
        info!("   Exchange deadline: {}ms", exchange_deadline(policy).as_millis());

        let client = reqwest::Client::builder()
            .connect_timeout(policy.connect_timeout)
            .read_timeout(policy.read_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(format!("endpoint-monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            deadline: exchange_deadline(policy),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ProbeRequest) -> std::result::Result<ProbeResponse, TransportError> {
        match timeout(self.deadline, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::new(
                TransportErrorKind::ReadTimeout,
                format!("no complete response within {}ms", self.deadline.as_millis()),
            )),
        }
    }

    fn implementation_name(&self) -> &'static str {
        "reqwest"
    }
}

impl ReqwestTransport {
    async fn exchange(&self, request: ProbeRequest) -> std::result::Result<ProbeResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(into_transport_error)?;
        let status = response.status().as_u16();

        // Latency covers the whole response, so drain the body before returning.
        let body = response.bytes().await.map_err(into_transport_error)?;
        debug!("Probe response {} with {} body bytes", status, body.len());

        Ok(ProbeResponse {
            status,
            body_len: body.len(),
        })
    }
}

fn into_transport_error(err: reqwest::Error) -> TransportError {
    TransportError::new(classify(&err), error_chain_message(&err))
}

fn classify(err: &reqwest::Error) -> TransportErrorKind {
    let connecting = err.is_connect();

    if err.is_timeout() {
        return if connecting {
            TransportErrorKind::ConnectTimeout
        } else {
            TransportErrorKind::ReadTimeout
        };
    }
    if let Some(kind) = classify_error_chain(err, connecting) {
        return kind;
    }
    if connecting {
        TransportErrorKind::Connect
    } else if err.is_body() || err.is_decode() || err.is_request() {
        TransportErrorKind::Protocol
    } else {
        TransportErrorKind::Other
    }
}

/// "outer: inner: root" rendering of an error and its sources
fn error_chain_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
