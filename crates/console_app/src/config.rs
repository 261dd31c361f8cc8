//! Backend address configuration.
//!
//! The base URL scheme selects plain vs. secure transport for both the
//! REST endpoints and the log stream (http maps to ws, https to wss).

use anyhow::Context;
use url::Url;

/// Environment variable holding the backend base address.
pub const BACKEND_ENV: &str = "CRAWL_CONSOLE_API";

const DEFAULT_BACKEND: &str = "http://localhost:8000/";

pub fn backend_base() -> anyhow::Result<Url> {
    let raw = std::env::var(BACKEND_ENV).unwrap_or_else(|_| DEFAULT_BACKEND.to_string());
    // A trailing slash keeps Url::join from eating the last path segment.
    let raw = if raw.ends_with('/') {
        raw
    } else {
        format!("{raw}/")
    };
    Url::parse(&raw).with_context(|| format!("invalid backend address {raw}"))
}
