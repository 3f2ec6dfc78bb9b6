use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

pub const APP_USER_AGENT: &str = concat!("TaleLauncher/", env!("CARGO_PKG_VERSION"));

/// Shared client for probes, manifests and transfers.
///
/// Content encoding is pinned to `identity` so byte ranges and
/// `Content-Length` refer to the bytes that land on disk. No overall
/// timeout is set: patch artifacts are large and only presence checks are
/// time-bounded (per request).
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}
