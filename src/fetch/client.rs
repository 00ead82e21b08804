//! Shared HTTP client construction policy.
//!
//! Listing, probe and archive clients share timeout and compression defaults;
//! only the User-Agent differs between them.

use std::time::Duration;

use reqwest::Client;

use super::FetchError;

/// Default HTTP connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (30 seconds).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Connect/read timeouts applied to every client built by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Total request timeout in seconds.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds an HTTP client with the given User-Agent and timeouts.
///
/// # Errors
///
/// Returns [`FetchError::ClientBuild`] when the TLS backend or proxy settings
/// cannot be initialized.
pub fn build_http_client(
    user_agent: impl Into<String>,
    timeouts: HttpTimeouts,
) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent.into())
        .gzip(true)
        .build()
        .map_err(|source| FetchError::ClientBuild { source })
}
