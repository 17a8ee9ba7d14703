//! Continuous monitoring command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cli::format_result;
use crate::config::{load_endpoints, MonitorSettings};
use crate::monitor::Monitor;
use crate::probe::HealthChecker;
use crate::utils::format_timestamp;

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// YAML file listing the endpoints to probe
    pub endpoints: PathBuf,

    /// Also print each endpoint's result every cycle
    #[arg(long, default_value = "false")]
    pub details: bool,
}

impl MonitorArgs {
    /// Run check cycles until Ctrl-C, printing cumulative per-domain
    /// availability after every cycle.
    pub async fn execute(&self, settings: &MonitorSettings) -> Result<()> {
        let endpoints = load_endpoints(&self.endpoints).with_context(|| {
            format!("Failed to load endpoints from {}", self.endpoints.display())
        })?;

        info!("📋 Monitor Configuration:");
        info!("   Endpoints: {}", endpoints.len());
        info!("   Check interval: {}s", settings.monitor.check_interval_secs);
        info!("   Concurrency: {}", settings.monitor.concurrency);

        let checker = HealthChecker::with_policy(settings.probe.policy())?;
        let monitor = Monitor::new(
            checker,
            endpoints,
            settings.monitor.check_interval(),
            settings.monitor.concurrency,
        );

        let shutdown = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("🛑 Received Ctrl-C"),
                Err(e) => {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await
                }
            }
        };

        let tracker = monitor
            .run(shutdown, |results, tracker| {
                if self.details {
                    for result in results {
                        println!("{} {}", format_timestamp(result.checked_at), format_result(result));
                    }
                }
                for line in tracker.report_lines() {
                    println!("{}", line);
                }
            })
            .await;

        for (domain, availability) in tracker.iter() {
            info!("Final availability for {}: {}%", domain, availability);
        }
        Ok(())
    }
}
