//! HTTP fetching with a bounded transport-retry budget.
//!
//! [`Fetcher::fetch`] performs a GET and returns a [`FetchResult`]. Transport
//! failures (connect, TLS, timeout, generic request errors) are retried per the
//! [`RetryPolicy`]; any HTTP response, including 4xx/5xx, ends the loop and is
//! reported as [`FetchResult::Success`].
//!
//! # Example
//!
//! ```no_run
//! use letter_harvester::fetch::{FetchResult, Fetcher, HttpTimeouts, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(RetryPolicy::default(), HttpTimeouts::default())?;
//! match fetcher.fetch("https://example.com/letters/").await {
//!     FetchResult::Success { status, body } => println!("{status}: {} bytes", body.len()),
//!     FetchResult::Failure(kind) => println!("gave up: {kind}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod retry;

pub use client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts, build_http_client,
};
pub use error::{FetchError, FetchFailureKind};
pub use retry::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, RetryDecision, RetryPolicy, retry_transport,
};

use reqwest::Client;
use tracing::{debug, instrument};

use crate::user_agent;

/// Outcome of a fetch: an HTTP response of any status, or a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The server answered. `status` may be any code.
    Success {
        /// HTTP status code.
        status: u16,
        /// Response body decoded as text.
        body: String,
    },
    /// Every attempt failed at the transport level.
    Failure(FetchFailureKind),
}

impl FetchResult {
    /// Returns the body when the response status was 200.
    #[must_use]
    pub fn ok_body(&self) -> Option<&str> {
        match self {
            Self::Success { status: 200, body } => Some(body),
            _ => None,
        }
    }
}

/// GET client with a fixed-delay retry policy for transport failures.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher that identifies itself with the tool's User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(policy: RetryPolicy, timeouts: HttpTimeouts) -> Result<Self, FetchError> {
        let client = build_http_client(user_agent::default_user_agent(), timeouts)?;
        Ok(Self { client, policy })
    }

    /// Creates a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the underlying HTTP client, shared with the availability checker.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying transport failures per the policy.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let outcome = retry_transport(&self.policy, url, || get_once(&self.client, url)).await;
        match outcome {
            Ok((status, body)) => {
                debug!(status, bytes = body.len(), "Fetched");
                FetchResult::Success { status, body }
            }
            Err(error) => FetchResult::Failure(error.kind()),
        }
    }
}

/// Performs one GET and reads the body as text.
///
/// # Errors
///
/// Returns a classified [`FetchError`] when the request or body read fails.
pub(crate) async fn get_once(client: &Client, url: &str) -> Result<(u16, String), FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::from_reqwest(url, source))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|source| FetchError::from_reqwest(url, source))?;
    Ok((status, body))
}
