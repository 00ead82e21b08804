//! Error types for archive lookups.
//!
//! A missing archive record is not an error; it is
//! [`super::ArchiveSnapshot::NotFound`]. Everything here means the archive
//! could not answer the question at all.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that can occur while querying the archive index.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The lookup URL could not be composed.
    #[error("invalid archive query for '{url}': {reason}")]
    InvalidQuery {
        /// The document URL being looked up.
        url: String,
        /// Why the query could not be built.
        reason: String,
    },

    /// The index request failed at the transport level.
    #[error("archive index unreachable: {source}")]
    Transport {
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The index answered with a non-success status.
    #[error("archive index returned HTTP {status} for '{url}'")]
    Status {
        /// The document URL being looked up.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The index payload could not be interpreted.
    #[error("malformed archive index response for '{url}': {reason}")]
    Malformed {
        /// The document URL being looked up.
        url: String,
        /// Parse failure description.
        reason: String,
    },
}

impl ArchiveError {
    /// Creates an `InvalidQuery` error.
    pub fn invalid_query(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Malformed` error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
