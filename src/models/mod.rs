//! Endpoint descriptors and probe verdicts

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

use crate::probe::TransportError;
use crate::utils::{duration_to_ms, extract_domain, is_http_scheme};

/// Method used when a descriptor does not name one
pub const DEFAULT_METHOD: &str = "GET";

/// Reasons a descriptor cannot be probed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),
}

/// One monitored endpoint as it appears in the endpoint file.
///
/// Fields are private: a descriptor is built once (from config or the
/// `with_*` builders) and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl EndpointDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
            method: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Identifier used in reports: the configured name, or the URL.
    pub fn id(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Effective method: uppercased as written, `GET` when absent or empty.
    pub fn method(&self) -> String {
        match self.method.as_deref() {
            Some(m) if !m.is_empty() => m.to_uppercase(),
            _ => DEFAULT_METHOD.to_string(),
        }
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Host of the endpoint URL without its port.
    pub fn domain(&self) -> String {
        extract_domain(&self.url)
    }

    /// Convert this descriptor into a request-ready [`ProbeTarget`].
    ///
    /// The body is checked first; an empty body string counts as no body.
    pub fn validate(&self) -> Result<ProbeTarget, DescriptorError> {
        let body = match self.body.as_deref() {
            None | Some("") => RequestBody::NoBody,
            Some(raw) => serde_json::from_str(raw)
                .map(RequestBody::RawJson)
                .map_err(|e| DescriptorError::MalformedBody(e.to_string()))?,
        };

        let url = Url::parse(&self.url).map_err(|e| DescriptorError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !is_http_scheme(&url) {
            return Err(DescriptorError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(DescriptorError::MissingHost(self.url.clone()));
        }

        let method_name = self.method();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| DescriptorError::InvalidMethod(method_name.clone()))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| DescriptorError::InvalidHeader(key.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| DescriptorError::InvalidHeader(key.clone()))?;
            // Keys differing only in case are distinct map entries; keep both.
            headers.append(name, value);
        }

        Ok(ProbeTarget {
            url,
            method,
            headers,
            body,
        })
    }
}

/// Request body of a validated descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    NoBody,
    RawJson(serde_json::Value),
}

impl RequestBody {
    /// Serialized JSON bytes, `None` for [`RequestBody::NoBody`].
    pub fn to_bytes(&self) -> Result<Option<Bytes>, serde_json::Error> {
        match self {
            RequestBody::NoBody => Ok(None),
            RequestBody::RawJson(value) => serde_json::to_vec(value).map(|v| Some(Bytes::from(v))),
        }
    }
}

/// A descriptor that passed validation and can be sent as-is
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Binary liveness classification of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthVerdict {
    Up,
    Down,
}

impl HealthVerdict {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthVerdict::Up)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthVerdict::Up => "UP",
            HealthVerdict::Down => "DOWN",
        }
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe ended in [`HealthVerdict::Down`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeFailure {
    #[error("endpoint not probeable: {0}")]
    Invalid(#[from] DescriptorError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("response took {:.3}ms (threshold {}ms)", .latency.as_secs_f64() * 1000.0, .threshold.as_millis())]
    SlowResponse { latency: Duration, threshold: Duration },
}

impl ProbeFailure {
    /// Short label for structured log fields
    pub fn cause(&self) -> &'static str {
        match self {
            ProbeFailure::Invalid(DescriptorError::MalformedBody(_)) => "malformed_body",
            ProbeFailure::Invalid(_) => "invalid_descriptor",
            ProbeFailure::Transport(e) => e.kind.as_str(),
            ProbeFailure::UnexpectedStatus(_) => "status",
            ProbeFailure::SlowResponse { .. } => "latency",
        }
    }
}

/// Verdict of one probe plus what was observed on the way to it
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub verdict: HealthVerdict,
    pub status: Option<u16>,
    pub latency: Option<Duration>,
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn up(status: u16, latency: Duration) -> Self {
        Self {
            verdict: HealthVerdict::Up,
            status: Some(status),
            latency: Some(latency),
            failure: None,
        }
    }

    pub fn down(failure: impl Into<ProbeFailure>) -> Self {
        Self {
            verdict: HealthVerdict::Down,
            status: None,
            latency: None,
            failure: Some(failure.into()),
        }
    }

    /// A response arrived but did not qualify as UP.
    pub fn rejected(status: u16, latency: Duration, failure: ProbeFailure) -> Self {
        Self {
            verdict: HealthVerdict::Down,
            status: Some(status),
            latency: Some(latency),
            failure: Some(failure),
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        self.latency.map(duration_to_ms)
    }
}
