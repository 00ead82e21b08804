//! Web-archive fallback for broken document links.
//!
//! When a document URL answers 404 or 403, [`WaybackResolver`] asks the
//! Wayback Machine CDX index for the newest capture of the exact URL and
//! returns a timestamp-qualified snapshot URL.
//!
//! # Example
//!
//! ```no_run
//! use letter_harvester::archive::{ArchiveSnapshot, WaybackResolver};
//! use letter_harvester::fetch::HttpTimeouts;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = WaybackResolver::new(HttpTimeouts::default())?;
//! match resolver.resolve("https://example.com/q3-letter.pdf").await? {
//!     ArchiveSnapshot::Found(snapshot) => println!("{}", snapshot.archive_url),
//!     ArchiveSnapshot::NotFound => println!("never archived"),
//! }
//! # Ok(())
//! # }
//! ```

mod cdx;
mod error;

pub use error::ArchiveError;

use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, info, instrument};
use url::Url;

use crate::fetch::{FetchError, HttpTimeouts, build_http_client};
use crate::user_agent;

/// Default CDX index endpoint.
pub const DEFAULT_CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Default prefix for snapshot URLs.
pub const DEFAULT_SNAPSHOT_BASE: &str = "https://web.archive.org/web";

/// A capture of a document in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// CDX capture timestamp (`YYYYMMDDhhmmss`).
    pub timestamp: String,
    /// The URL as it was captured.
    pub original: String,
    /// Timestamp-qualified URL serving the captured copy.
    pub archive_url: String,
}

/// Result of an archive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSnapshot {
    /// The newest capture of the URL.
    Found(Snapshot),
    /// The archive holds no capture of the URL.
    NotFound,
}

/// Wayback Machine CDX client.
#[derive(Debug, Clone)]
pub struct WaybackResolver {
    client: Client,
    endpoint: String,
    snapshot_base: String,
}

impl WaybackResolver {
    /// Creates a resolver against the public Wayback Machine.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Transport`] if the HTTP client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ArchiveError> {
        Self::with_endpoint(DEFAULT_CDX_ENDPOINT, DEFAULT_SNAPSHOT_BASE, timeouts)
    }

    /// Creates a resolver with a custom CDX endpoint and snapshot prefix
    /// (mirrors, or wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Transport`] if the HTTP client cannot be built.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        snapshot_base: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ArchiveError> {
        let client = build_http_client(user_agent::random_chrome_user_agent(), timeouts)
            .map_err(|source| ArchiveError::Transport { source })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            snapshot_base: snapshot_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Looks up the newest capture of `url`.
    ///
    /// Each call sends a freshly randomized browser User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the index cannot be queried or its reply
    /// cannot be parsed. An absent record is `Ok(ArchiveSnapshot::NotFound)`.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn resolve(&self, url: &str) -> Result<ArchiveSnapshot, ArchiveError> {
        info!("Link broken, trying archive");
        let query = self.query_url(url)?;
        let agent = user_agent::random_chrome_user_agent();
        debug!(user_agent = %agent, "Querying archive index");

        let response = self
            .client
            .get(query)
            .header(USER_AGENT, agent)
            .send()
            .await
            .map_err(|source| ArchiveError::Transport {
                source: FetchError::from_reqwest(url, source),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ArchiveError::Transport {
                source: FetchError::from_reqwest(url, source),
            })?;

        match cdx::parse_newest_record(url, &body)? {
            Some(record) => {
                let snapshot = Snapshot {
                    archive_url: self.snapshot_url(&record.timestamp, &record.original),
                    timestamp: record.timestamp,
                    original: record.original,
                };
                info!(archive_url = %snapshot.archive_url, "Newest archive snapshot found");
                Ok(ArchiveSnapshot::Found(snapshot))
            }
            None => {
                info!("No archive record for URL");
                Ok(ArchiveSnapshot::NotFound)
            }
        }
    }

    fn query_url(&self, url: &str) -> Result<Url, ArchiveError> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("url", url),
                ("output", "json"),
                ("fl", "timestamp,original"),
                ("limit", "-1"),
            ],
        )
        .map_err(|e| ArchiveError::invalid_query(url, e.to_string()))
    }

    fn snapshot_url(&self, timestamp: &str, original: &str) -> String {
        format!("{}/{timestamp}/{original}", self.snapshot_base)
    }
}
