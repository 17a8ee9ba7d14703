//! Configuration: monitor settings and endpoint files

pub mod endpoints;
pub mod settings;

pub use endpoints::{load_endpoints, parse_endpoints};
pub use settings::{LoggingConfig, MonitorSettings, OrchestratorConfig, ProbeConfig, RuntimeConfig};
