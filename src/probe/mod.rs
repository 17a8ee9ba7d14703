//! Endpoint probing
//!
//! - [`HealthChecker`]: probe-and-classify evaluator
//! - [`Transport`]: seam between the evaluator and the HTTP client
//! - [`ReqwestTransport`]: production transport

pub mod core;
pub mod evaluator;
pub mod reqwest_impl;

pub use self::core::{
    Clock, MonotonicClock, ProbePolicy, ProbeRequest, ProbeResponse, Transport, TransportError,
    TransportErrorKind,
};
pub use evaluator::HealthChecker;
pub use reqwest_impl::{exchange_deadline, ReqwestTransport};
