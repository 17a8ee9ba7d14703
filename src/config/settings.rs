//! Monitor configuration settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::probe::ProbePolicy;

/// Main configuration for the endpoint monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Log level or `EnvFilter` directive
    pub log_level: String,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Probe timeouts and latency threshold
    pub probe: ProbeConfig,

    /// Check cycle configuration
    pub monitor: OrchestratorConfig,

    /// Runtime configuration
    pub runtime: RuntimeConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write logs to a daily-rolling file (default: false)
    pub enable_file_logging: bool,

    /// Directory for log files
    pub log_dir: PathBuf,
}

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Connection-establishment timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Response-read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Slowest response still reported as UP, in milliseconds
    pub latency_threshold_ms: u64,
}

/// Check cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Seconds between the start of two check cycles
    pub check_interval_secs: u64,

    /// Maximum number of probes in flight at once
    pub concurrency: usize,
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime mode: "single_threaded" or "multi_threaded"
    pub mode: String,

    /// Number of worker threads for multi-threaded mode (None = auto-detect CPU cores)
    pub worker_threads: Option<usize>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            logging: LoggingConfig::default(),
            probe: ProbeConfig::default(),
            monitor: OrchestratorConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_file_logging: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let policy = ProbePolicy::default();
        Self {
            connect_timeout_ms: policy.connect_timeout.as_millis() as u64,
            read_timeout_ms: policy.read_timeout.as_millis() as u64,
            latency_threshold_ms: policy.latency_threshold.as_millis() as u64,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 15,
            concurrency: 16,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: "multi_threaded".to_string(),
            worker_threads: None,
        }
    }
}

impl ProbeConfig {
    pub fn policy(&self) -> ProbePolicy {
        ProbePolicy {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            latency_threshold: Duration::from_millis(self.latency_threshold_ms),
        }
    }
}

impl OrchestratorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

impl MonitorSettings {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {}", path.as_ref().display()))?;

        let settings: MonitorSettings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.as_ref().display()))?;

        Ok(settings)
    }

    /// Load settings from an optional YAML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Override settings from process environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Override settings from any key lookup; unparseable values are ignored
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup("RUST_LOG") {
            self.log_level = log_level;
        }

        if let Some(enable) = lookup("MONITOR_ENABLE_FILE_LOGGING") {
            self.logging.enable_file_logging = enable.to_lowercase() == "true";
        }

        if let Some(dir) = lookup("MONITOR_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }

        if let Some(timeout) = lookup("MONITOR_CONNECT_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.probe.connect_timeout_ms = timeout;
            }
        }

        if let Some(timeout) = lookup("MONITOR_READ_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                self.probe.read_timeout_ms = timeout;
            }
        }

        if let Some(threshold) = lookup("MONITOR_LATENCY_THRESHOLD_MS") {
            if let Ok(threshold) = threshold.parse() {
                self.probe.latency_threshold_ms = threshold;
            }
        }

        if let Some(interval) = lookup("MONITOR_CHECK_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse() {
                self.monitor.check_interval_secs = interval;
            }
        }

        if let Some(concurrency) = lookup("MONITOR_CONCURRENCY") {
            if let Ok(concurrency) = concurrency.parse() {
                self.monitor.concurrency = concurrency;
            }
        }

        if let Some(mode) = lookup("MONITOR_RUNTIME_MODE") {
            self.runtime.mode = mode;
        }

        if let Some(threads) = lookup("MONITOR_WORKER_THREADS") {
            if let Ok(threads) = threads.parse() {
                self.runtime.worker_threads = Some(threads);
            }
        }
    }

    /// Reject settings the monitor cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.probe.connect_timeout_ms == 0 || self.probe.read_timeout_ms == 0 {
            return Err(Error::Config("probe timeouts must be greater than zero".to_string()));
        }
        if self.probe.latency_threshold_ms == 0 {
            return Err(Error::Config("latency threshold must be greater than zero".to_string()));
        }
        if self.monitor.check_interval_secs == 0 {
            return Err(Error::Config("check interval must be greater than zero".to_string()));
        }
        if self.monitor.concurrency == 0 {
            return Err(Error::Config("concurrency must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_probe_policy() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.probe.policy(), ProbePolicy::default());
        assert_eq!(settings.monitor.check_interval(), Duration::from_secs(15));
        assert_eq!(settings.monitor.concurrency, 16);
        assert_eq!(settings.runtime.mode, "multi_threaded");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level: debug\nmonitor:\n  concurrency: 4\n").unwrap();

        let settings = MonitorSettings::from_yaml_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.monitor.concurrency, 4);
        assert_eq!(settings.monitor.check_interval_secs, 15);
        assert_eq!(settings.probe.read_timeout_ms, 300);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = MonitorSettings::from_yaml_file("/nonexistent/monitor.yml").unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_overrides_applied_and_garbage_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MONITOR_CONCURRENCY", "32"),
            ("MONITOR_CHECK_INTERVAL_SECS", "soon"),
            ("MONITOR_ENABLE_FILE_LOGGING", "TRUE"),
            ("MONITOR_LATENCY_THRESHOLD_MS", "750"),
        ]);
        let mut settings = MonitorSettings::default();
        settings.apply_overrides_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.monitor.concurrency, 32);
        assert_eq!(settings.monitor.check_interval_secs, 15);
        assert!(settings.logging.enable_file_logging);
        assert_eq!(
            settings.probe.policy().latency_threshold,
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_threshold_above_budgets_reaches_transport() {
        let env: HashMap<&str, &str> = HashMap::from([("MONITOR_LATENCY_THRESHOLD_MS", "2000")]);
        let mut settings = MonitorSettings::default();
        settings.apply_overrides_with(|key| env.get(key).map(|v| v.to_string()));

        let policy = settings.probe.policy();
        assert_eq!(policy.latency_threshold, Duration::from_millis(2000));
        assert!(crate::probe::exchange_deadline(&policy) > policy.latency_threshold);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut settings = MonitorSettings::default();
        settings.monitor.concurrency = 0;
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut settings = MonitorSettings::default();
        settings.monitor.check_interval_secs = 0;
        assert!(settings.validate().is_err());
    }
}
