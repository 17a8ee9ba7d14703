//! Endpoint file validation command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::load_endpoints;
use crate::models::{EndpointDescriptor, RequestBody};
use crate::utils::is_https;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// YAML file listing the endpoints to validate
    pub endpoints: PathBuf,
}

impl ValidateArgs {
    /// Check every descriptor without sending any request.
    ///
    /// Returns whether every descriptor can be probed.
    pub fn execute(&self) -> Result<bool> {
        let endpoints = load_endpoints(&self.endpoints).with_context(|| {
            format!("Failed to load endpoints from {}", self.endpoints.display())
        })?;

        let mut invalid = 0;
        for endpoint in &endpoints {
            match describe(endpoint) {
                Ok(line) => println!("{}", line),
                Err(line) => {
                    invalid += 1;
                    warn!("{}", line);
                    println!("{}", line);
                }
            }
        }

        info!("{} of {} endpoints valid", endpoints.len() - invalid, endpoints.len());
        Ok(invalid == 0)
    }
}

/// Report line for one descriptor; `Err` when it cannot be probed.
fn describe(endpoint: &EndpointDescriptor) -> std::result::Result<String, String> {
    match endpoint.validate() {
        Ok(target) => {
            let body = match target.body {
                RequestBody::NoBody => "no body",
                RequestBody::RawJson(_) => "json body",
            };
            let transport = if is_https(&target.url) { "tls" } else { "plain" };
            Ok(format!(
                "{} [{}]: ok ({} {}, {}, {})",
                endpoint.id(),
                endpoint.domain(),
                target.method,
                target.url,
                body,
                transport
            ))
        }
        Err(e) => Err(format!("{} [{}]: invalid ({})", endpoint.id(), endpoint.domain(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_describe_valid_post() {
        let endpoint = EndpointDescriptor::new("https://fetch.com/some/post/endpoint")
            .with_name("post")
            .with_method("POST")
            .with_body(r#"{"foo":"bar"}"#);
        assert_eq!(
            describe(&endpoint).unwrap(),
            "post [fetch.com]: ok (POST https://fetch.com/some/post/endpoint, json body, tls)"
        );
    }

    #[test]
    fn test_describe_malformed_body() {
        let endpoint = EndpointDescriptor::new("http://example.com/").with_body("{invalid}");
        assert!(describe(&endpoint).unwrap_err().starts_with("http://example.com/ [example.com]: invalid ("));
    }

    #[test]
    fn test_execute_reports_invalid_entries() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- url: https://fetch.com/\n- url: ftp://fetch.com/files\n  name: ftp mirror\n"
        )
        .unwrap();

        let args = ValidateArgs {
            endpoints: file.path().to_path_buf(),
        };
        assert!(!args.execute().unwrap());
    }

    #[test]
    fn test_execute_accepts_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "- url: https://fetch.com/\n  method: HEAD\n").unwrap();

        let args = ValidateArgs {
            endpoints: file.path().to_path_buf(),
        };
        assert!(args.execute().unwrap());
    }
}
