//! One-shot check command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::cli::format_result;
use crate::config::{load_endpoints, MonitorSettings};
use crate::monitor::{run_cycle, AvailabilityTracker};
use crate::probe::HealthChecker;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// YAML file listing the endpoints to probe
    pub endpoints: PathBuf,
}

impl CheckArgs {
    /// Probe every endpoint once and print one line per endpoint followed
    /// by the per-domain availability lines.
    ///
    /// Returns whether every endpoint came back UP.
    pub async fn execute(&self, settings: &MonitorSettings) -> Result<bool> {
        let endpoints = load_endpoints(&self.endpoints).with_context(|| {
            format!("Failed to load endpoints from {}", self.endpoints.display())
        })?;
        info!("🔍 Checking {} endpoints", endpoints.len());

        let checker = HealthChecker::with_policy(settings.probe.policy())?;
        let results = run_cycle(&checker, &endpoints, settings.monitor.concurrency).await;

        let mut tracker = AvailabilityTracker::new();
        tracker.record_all(&results);

        for result in &results {
            println!("{}", format_result(result));
        }
        for line in tracker.report_lines() {
            println!("{}", line);
        }

        let down = results.iter().filter(|r| !r.verdict().is_up()).count();
        info!("✅ Check complete: {} up, {} down", results.len() - down, down);
        Ok(down == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unhealthy() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "- name: closed port\n  url: http://{}/\n", addr).unwrap();

        let args = CheckArgs {
            endpoints: file.path().to_path_buf(),
        };
        let healthy = args.execute(&MonitorSettings::default()).await.unwrap();
        assert!(!healthy);
    }

    #[tokio::test]
    async fn test_missing_endpoint_file_is_error() {
        let args = CheckArgs {
            endpoints: PathBuf::from("/nonexistent/endpoints.yml"),
        };
        let err = args.execute(&MonitorSettings::default()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load endpoints"));
    }
}
