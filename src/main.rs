//! Main entry point for the Endpoint Monitor

use clap::{Parser, Subcommand};
use endpoint_monitor::{
    cli::{CheckArgs, MonitorArgs, ValidateArgs},
    init_logger_with_config,
    log_debug, log_info,
    runtime::run_with_runtime,
    MonitorSettings,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "endpoint-monitor")]
#[command(about = "HTTP(S) endpoint health checker with per-domain availability")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (YAML); environment variables override it
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every endpoint once; exits non-zero if any is DOWN
    #[command(name = "check")]
    Check(CheckArgs),

    /// Probe every endpoint on an interval and report availability
    #[command(name = "monitor")]
    Monitor(MonitorArgs),

    /// Validate an endpoint file without sending requests
    #[command(name = "validate")]
    Validate(ValidateArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = MonitorSettings::load(cli.settings.as_deref())?;
    if cli.verbose {
        settings.log_level = "debug".to_string();
    } else if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    settings.validate()?;

    // Held until exit so buffered file logs are flushed
    let _guard = init_logger_with_config(&settings.log_level, &settings.logging);

    log_info!("📋 Endpoint Monitor v{}", env!("CARGO_PKG_VERSION"));
    log_debug!("Settings: {:?}", settings);

    let runtime_config = settings.runtime.clone();
    run_with_runtime(&runtime_config, async_main(cli.command, settings))
}

async fn async_main(command: Commands, settings: MonitorSettings) -> anyhow::Result<ExitCode> {
    let healthy = match command {
        Commands::Check(args) => args.execute(&settings).await?,
        Commands::Monitor(args) => {
            args.execute(&settings).await?;
            true
        }
        Commands::Validate(args) => args.execute()?,
    };

    Ok(if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
