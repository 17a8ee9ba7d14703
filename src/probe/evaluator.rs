//! Single-shot endpoint health evaluation.
//!
//! [`HealthChecker::check`] turns one [`EndpointDescriptor`] into an UP/DOWN
//! verdict. Every failure is absorbed here; callers wanting the reason use
//! [`HealthChecker::probe`], which keeps the cause alongside the verdict.

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{
    DescriptorError, EndpointDescriptor, HealthVerdict, ProbeFailure, ProbeOutcome,
};
use crate::probe::core::{Clock, MonotonicClock, ProbePolicy, ProbeRequest, Transport};
use crate::probe::reqwest_impl::ReqwestTransport;

/// The UP/DOWN evaluator
pub struct HealthChecker<T = ReqwestTransport, C = MonotonicClock> {
    transport: T,
    clock: C,
    policy: ProbePolicy,
}

impl HealthChecker {
    /// Checker with the default 200 ms connect / 300 ms read / 500 ms latency policy.
    pub fn new() -> Result<Self> {
        Self::with_policy(ProbePolicy::default())
    }

    /// Checker backed by reqwest with the given policy.
    ///
    /// # Errors
    /// Returns `Error::Http` if the HTTP client cannot be built.
    pub fn with_policy(policy: ProbePolicy) -> Result<Self> {
        let transport = ReqwestTransport::new(&policy)?;
        Ok(Self::from_parts(transport, MonotonicClock::new(), policy))
    }
}

impl<T: Transport, C: Clock> HealthChecker<T, C> {
    pub fn from_parts(transport: T, clock: C, policy: ProbePolicy) -> Self {
        Self {
            transport,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Probe the endpoint once and return its verdict.
    pub async fn check(&self, endpoint: &EndpointDescriptor) -> HealthVerdict {
        self.probe(endpoint).await.verdict
    }

    /// Probe the endpoint once, keeping status, latency and failure cause.
    pub async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome {
        let outcome = self.evaluate(endpoint).await;

        match &outcome.failure {
            None => debug!(
                endpoint = %endpoint.id(),
                url = %endpoint.url(),
                method = %endpoint.method(),
                status = ?outcome.status,
                latency_ms = ?outcome.latency_ms(),
                "Endpoint is UP"
            ),
            Some(failure) => warn!(
                endpoint = %endpoint.id(),
                url = %endpoint.url(),
                method = %endpoint.method(),
                status = ?outcome.status,
                latency_ms = ?outcome.latency_ms(),
                cause = failure.cause(),
                error = %failure,
                "Endpoint is DOWN"
            ),
        }

        outcome
    }

    async fn evaluate(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome {
        // No request leaves this function for a descriptor that fails validation.
        let target = match endpoint.validate() {
            Ok(target) => target,
            Err(e) => return ProbeOutcome::down(e),
        };

        let body = match target.body.to_bytes() {
            Ok(body) => body,
            Err(e) => return ProbeOutcome::down(DescriptorError::MalformedBody(e.to_string())),
        };

        let mut headers = target.headers;
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let request = ProbeRequest {
            method: target.method,
            url: target.url,
            headers,
            body,
        };

        let start = self.clock.now();
        match self.transport.send(request).await {
            Ok(response) => {
                let elapsed = self.clock.now().saturating_sub(start);
                self.classify(response.status, elapsed)
            }
            Err(e) => ProbeOutcome::down(e),
        }
    }

    /// UP iff the status is 2xx and `elapsed` is within the latency threshold.
    pub fn classify(&self, status: u16, elapsed: Duration) -> ProbeOutcome {
        if !(200..=299).contains(&status) {
            return ProbeOutcome::rejected(status, elapsed, ProbeFailure::UnexpectedStatus(status));
        }
        if elapsed > self.policy.latency_threshold {
            return ProbeOutcome::rejected(
                status,
                elapsed,
                ProbeFailure::SlowResponse {
                    latency: elapsed,
                    threshold: self.policy.latency_threshold,
                },
            );
        }
        ProbeOutcome::up(status, elapsed)
    }
}
