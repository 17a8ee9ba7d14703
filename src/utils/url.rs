//! URL utility functions

use url::Url;

/// Parse URL and extract components
pub fn parse_url(url_str: &str) -> Result<Url, url::ParseError> {
    Url::parse(url_str)
}

/// Check if URL is HTTPS
pub fn is_https(url: &Url) -> bool {
    url.scheme() == "https"
}

/// Check if URL uses a scheme the prober can speak
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Lowercase host of a URL without its port.
///
/// Falls back to the raw string when the URL does not parse or has no host,
/// so every endpoint still lands in some availability bucket.
pub fn extract_domain(url_str: &str) -> String {
    parse_url(url_str)
        .ok()
        .and_then(|url| url.host_str().map(str::to_lowercase))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| url_str.to_string())
}
