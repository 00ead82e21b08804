//! Browser driver errors and navigation-failure classification.
//!
//! WebDriver reports failures as a W3C error status plus a message. Chromium
//! navigation failures carry a `net::ERR_*` code inside that message; the
//! classifier extracts the code token and decides the recovery from the status
//! and the code together.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Chromium net error codes that mean the server's TLS setup cannot be negotiated.
const CIPHER_MISMATCH_CODES: &[&str] = &[
    "ERR_SSL_VERSION_OR_CIPHER_MISMATCH",
    "ERR_SSL_PROTOCOL_ERROR",
];

/// Chromium net error code reported when a navigation turns into a download.
const DOWNLOAD_HANDOFF_CODE: &str = "ERR_ABORTED";

/// W3C WebDriver error status, reduced to the cases the harvester distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    /// `no such element`.
    NoSuchElement,
    /// `insecure certificate`.
    InsecureCertificate,
    /// `invalid session id`.
    InvalidSession,
    /// `session not created`.
    SessionNotCreated,
    /// `timeout`.
    Timeout,
    /// `unknown error`, the status Chromium uses for `net::ERR_*` failures.
    UnknownError,
    /// The WebDriver endpoint could not be reached or answered garbage.
    Transport,
    /// Any other status.
    Other,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoSuchElement => "no such element",
            Self::InsecureCertificate => "insecure certificate",
            Self::InvalidSession => "invalid session id",
            Self::SessionNotCreated => "session not created",
            Self::Timeout => "timeout",
            Self::UnknownError => "unknown error",
            Self::Transport => "transport",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// A failed browser command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFailure {
    /// Error status reported by the driver.
    pub status: DriverStatus,
    /// Human-readable message from the driver.
    pub message: String,
}

impl DriverFailure {
    /// Creates a failure.
    pub fn new(status: DriverStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Returns the Chromium `net::ERR_*` code in the message, without the
    /// `net::` prefix.
    #[must_use]
    pub fn net_error_code(&self) -> Option<&str> {
        let start = self.message.find("net::ERR_")? + "net::".len();
        let rest = &self.message[start..];
        let end = rest
            .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

impl fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// Recovery class for a navigation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Server TLS cannot be negotiated; skip the link.
    CipherMismatch,
    /// Navigation was aborted because the browser took over as a download.
    DownloadHandoff,
    /// The page lacked an element the automation needed; open manually.
    ElementMissing,
    /// Unknown failure; the session may be unusable.
    Fatal,
}

/// Maps a navigation failure onto its recovery class.
#[must_use]
pub fn classify_navigation_failure(failure: &DriverFailure) -> FailureClass {
    if failure.status == DriverStatus::NoSuchElement {
        return FailureClass::ElementMissing;
    }
    match failure.net_error_code() {
        Some(code) if CIPHER_MISMATCH_CODES.contains(&code) => FailureClass::CipherMismatch,
        Some(DOWNLOAD_HANDOFF_CODE) => FailureClass::DownloadHandoff,
        _ => FailureClass::Fatal,
    }
}

/// Errors surfaced by the download driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The download directory could not be prepared.
    #[error("cannot prepare download directory {path}: {source}")]
    DownloadDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The chromedriver process could not be started.
    #[error("failed to start browser driver '{binary}': {reason}")]
    ProcessStart {
        /// Driver binary that was launched.
        binary: PathBuf,
        /// Why startup failed.
        reason: String,
    },

    /// A WebDriver session could not be created.
    #[error("failed to create browser session at {endpoint}: {reason}")]
    SessionStart {
        /// WebDriver endpoint.
        endpoint: String,
        /// Why the session was refused.
        reason: String,
    },

    /// An unclassified navigation failure; the session may be unusable.
    #[error("browser navigation to {url} failed: {failure}")]
    Navigation {
        /// Target URL.
        url: String,
        /// The driver failure.
        failure: DriverFailure,
    },

    /// The session could not be shut down cleanly.
    #[error("failed to close browser session: {failure}")]
    Close {
        /// The driver failure.
        failure: DriverFailure,
    },
}

impl DriverError {
    /// Creates a `SessionStart` error.
    pub fn session_start(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SessionStart {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ProcessStart` error.
    pub fn process_start(binary: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProcessStart {
            binary: binary.into(),
            reason: reason.into(),
        }
    }
}
