//! Time utility functions

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format timestamp as RFC3339
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

/// Convert duration to fractional milliseconds
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_to_ms() {
        assert_eq!(duration_to_ms(Duration::from_millis(500)), 500.0);
        assert!(duration_to_ms(Duration::from_micros(500_001)) > 500.0);
    }
}
