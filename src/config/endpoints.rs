//! Endpoint file loading

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::EndpointDescriptor;

/// Load endpoint descriptors from a YAML file.
///
/// The file is a sequence of entries with `name`, `url`, `method`,
/// `headers` and `body` keys; only `url` is required.
pub fn load_endpoints<P: AsRef<Path>>(path: P) -> Result<Vec<EndpointDescriptor>> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_endpoints(&contents)
}

/// Parse endpoint descriptors from YAML text.
pub fn parse_endpoints(contents: &str) -> Result<Vec<EndpointDescriptor>> {
    if contents.trim().is_empty() {
        return Err(Error::Config("endpoint file is empty".to_string()));
    }

    let endpoints: Vec<EndpointDescriptor> = serde_yaml::from_str(contents)?;
    if endpoints.is_empty() {
        return Err(Error::Config("endpoint file lists no endpoints".to_string()));
    }

    Ok(endpoints)
}
