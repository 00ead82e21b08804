//! Error types for the fetch module.
//!
//! Only transport-level failures are errors here. HTTP error statuses are
//! ordinary responses and travel inside [`super::FetchResult::Success`].

use std::fmt;

use thiserror::Error;

/// Transport-level failure category reported in [`super::FetchResult::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    /// DNS resolution failed or the connection was refused/reset.
    Connect,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// TLS handshake or certificate failure.
    Tls,
    /// Any other request error (malformed URL, body decode, redirect loop).
    Request,
}

impl fmt::Display for FetchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::Request => "request",
        };
        f.write_str(label)
    }
}

/// Errors raised by a single HTTP attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection could not be established.
    #[error("connection error fetching {url}: {source}")]
    Connect {
        /// The URL that failed.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// TLS/SSL failure.
    #[error("TLS error fetching {url}: {source}")]
    Tls {
        /// The URL that failed.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Generic request failure.
    #[error("request error fetching {url}: {reason}")]
    Request {
        /// The URL that failed.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Classifies a reqwest error raised while fetching `url`.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if is_tls_error(&source) {
            Self::Tls { url, source }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Request {
                url,
                reason: source.to_string(),
            }
        }
    }

    /// Creates a generic request error.
    pub fn request(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Returns the transport failure category.
    #[must_use]
    pub fn kind(&self) -> FetchFailureKind {
        match self {
            Self::Connect { .. } => FetchFailureKind::Connect,
            Self::Timeout { .. } => FetchFailureKind::Timeout,
            Self::Tls { .. } => FetchFailureKind::Tls,
            Self::Request { .. } | Self::ClientBuild { .. } => FetchFailureKind::Request,
        }
    }
}

/// Checks whether a reqwest error stems from TLS negotiation.
///
/// reqwest exposes no TLS predicate, so the source chain is inspected.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if text.contains("certificate")
            || text.contains("tls")
            || text.contains("ssl")
            || text.contains("handshake")
        {
            return true;
        }
        current = err.source();
    }
    false
}
