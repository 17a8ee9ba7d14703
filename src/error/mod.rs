//! Error handling module for the endpoint monitor

use thiserror::Error;

/// Custom error type for the endpoint monitor
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for the endpoint monitor
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "endpoints.yml").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }

    #[test]
    fn test_config_error_message() {
        let err = Error::Config("concurrency must be greater than zero".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: concurrency must be greater than zero"
        );
    }
}
