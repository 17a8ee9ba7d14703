//! Command-line interface for one-shot checks, continuous monitoring and
//! endpoint file validation

pub mod check;
pub mod monitor;
pub mod validate;

pub use check::*;
pub use monitor::*;
pub use validate::*;

use crate::monitor::CheckResult;

/// One human-readable line per check result:
/// `<id> [<domain>]: <VERDICT> (<status>, <latency>, <cause>)`
pub fn format_result(result: &CheckResult) -> String {
    let outcome = &result.outcome;
    let mut details = Vec::new();

    if let Some(status) = outcome.status {
        details.push(format!("status {}", status));
    }
    if let Some(latency_ms) = outcome.latency_ms() {
        details.push(format!("{:.1}ms", latency_ms));
    }
    if let Some(failure) = &outcome.failure {
        details.push(format!("{}: {}", failure.cause(), failure));
    }

    format!(
        "{} [{}]: {} ({})",
        result.id,
        result.domain,
        result.verdict(),
        details.join(", ")
    )
}
