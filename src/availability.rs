//! Availability probe for candidate document URLs.
//!
//! A single GET, no retry. The probe only classifies the response; the body is
//! never used.

use std::fmt;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::fetch::FetchError;

/// Reachability classification of a document URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Any status other than 403/404.
    Ok,
    /// HTTP 404.
    NotFound,
    /// HTTP 403.
    Forbidden,
    /// Transport failure; terminal for the URL.
    Unreachable,
}

impl Availability {
    /// Maps an HTTP status code to an availability class.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            403 => Self::Forbidden,
            _ => Self::Ok,
        }
    }

    /// Returns true when the archive fallback should be attempted.
    #[must_use]
    pub fn wants_archive_fallback(self) -> bool {
        matches!(self, Self::NotFound | Self::Forbidden)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "ok",
            Self::NotFound => "not-found",
            Self::Forbidden => "forbidden",
            Self::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}

/// Issues availability probes with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct AvailabilityChecker {
    client: Client,
}

impl AvailabilityChecker {
    /// Creates a checker around `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Probes `url` once and classifies the result.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn check(&self, url: &str) -> Availability {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let availability = Availability::from_status(status);
                debug!(status, %availability, "Probed");
                availability
            }
            Err(source) => {
                let error = FetchError::from_reqwest(url, source);
                warn!(kind = %error.kind(), error = %error, "Probe failed, link unreachable");
                Availability::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert_eq!(Availability::from_status(200), Availability::Ok);
        assert_eq!(Availability::from_status(404), Availability::NotFound);
        assert_eq!(Availability::from_status(403), Availability::Forbidden);
        assert_eq!(Availability::from_status(500), Availability::Ok);
        assert_eq!(Availability::from_status(301), Availability::Ok);
        assert_eq!(Availability::from_status(410), Availability::Ok);
    }

    #[test]
    fn test_archive_fallback_only_for_not_found_and_forbidden() {
        assert!(Availability::NotFound.wants_archive_fallback());
        assert!(Availability::Forbidden.wants_archive_fallback());
        assert!(!Availability::Ok.wants_archive_fallback());
        assert!(!Availability::Unreachable.wants_archive_fallback());
    }
}
