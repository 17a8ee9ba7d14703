use crate::config::LoggingConfig;
use log::{debug, error, info, trace, warn, LevelFilter};
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static INIT: Once = Once::new();

/// File name prefix for the daily-rolling log file
pub const LOG_FILE_NAME: &str = "endpoint-monitor.log";

/// Initialize the global logger.
///
/// Console output goes to stderr so stdout stays reserved for verdicts and
/// availability lines. When file logging is enabled the returned guard must
/// be held until exit or buffered lines are lost.
pub fn init_logger_with_config(log_level: &str, config: &LoggingConfig) -> Option<WorkerGuard> {
    let mut guard = None;

    INIT.call_once(|| {
        let filter = EnvFilter::try_new(log_level).unwrap_or_else(|e| {
            eprintln!("Warning: Invalid log level '{}': {}", log_level, e);
            EnvFilter::new("info")
        });

        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(true);

        let file = if config.enable_file_logging {
            let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_NAME);
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            guard = Some(file_guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        } else {
            None
        };

        let subscriber = Registry::default().with(filter).with(console).with(file);
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Warning: Failed to set tracing subscriber: {:?}", e);
            return;
        }

        // Bridge log events to tracing (after subscriber is set up)
        if let Err(e) = LogTracer::init() {
            eprintln!("Warning: Failed to initialize LogTracer: {:?}", e);
        }

        log::set_max_level(level_filter(log_level));
    });

    guard
}

/// Max level for the `log` facade. Plain level names map directly; anything
/// else is a filter directive and is left to `EnvFilter`.
pub fn level_filter(log_level: &str) -> LevelFilter {
    log_level.trim().parse().unwrap_or(LevelFilter::Trace)
}

/// Log an error message
pub fn log_error(message: &str) {
    error!("{}", message);
}

/// Log an info message
pub fn log_info(message: &str) {
    info!("{}", message);
}

/// Log a warning message
pub fn log_warning(message: &str) {
    warn!("{}", message);
}

/// Log a debug message
pub fn log_debug(message: &str) {
    debug!("{}", message);
}

/// Log a trace message
pub fn log_trace(message: &str) {
    trace!("{}", message);
}

/// Convenience macro for logging errors
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error(&format!($($arg)*));
    };
}

/// Convenience macro for logging info messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info(&format!($($arg)*));
    };
}

/// Convenience macro for logging warning messages
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log_warning(&format!($($arg)*));
    };
}

/// Convenience macro for logging debug messages
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug(&format!($($arg)*));
    };
}

/// Convenience macro for logging trace messages
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::logging::log_trace(&format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("debug"), LevelFilter::Debug);
        assert_eq!(level_filter(" WARN "), LevelFilter::Warn);
        assert_eq!(level_filter("endpoint_monitor=debug,info"), LevelFilter::Trace);
    }

    #[test]
    fn test_macros_without_subscriber() {
        // No subscriber installed: records are dropped, nothing panics.
        log_info!("probe {} finished", "a");
        log_debug!("latency {}ms", 12);
        log_warning!("slow");
        log_error!("down");
        log_trace!("trace");
    }
}
