//! Errors that abort a harvest run.

use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;
use crate::fetch::{FetchError, FetchFailureKind};
use crate::archive::ArchiveError;
use crate::links::LinkError;

/// A run-ending failure. Per-link problems never surface here; they are
/// recorded in the report instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// An HTTP client could not be built.
    #[error("failed to set up HTTP client: {source}")]
    Setup {
        /// Underlying error.
        #[source]
        source: FetchError,
    },

    /// The archive client could not be built.
    #[error("failed to set up archive client: {source}")]
    ArchiveSetup {
        /// Underlying error.
        #[source]
        source: ArchiveError,
    },

    /// The listing page could not be reached after all attempts.
    #[error("listing page {url} unreachable ({kind})")]
    ListingUnreachable {
        /// Listing page URL.
        url: String,
        /// Last transport failure.
        kind: FetchFailureKind,
    },

    /// The listing page answered with a non-200 status.
    #[error("listing page {url} returned HTTP {status}")]
    ListingStatus {
        /// Listing page URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// Links could not be extracted.
    #[error(transparent)]
    Links(#[from] LinkError),

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No browser session could be started.
    #[error("browser session unavailable: {source}")]
    DriverLaunch {
        /// Underlying driver error.
        #[source]
        source: DriverError,
    },

    /// An unrecoverable browser failure stopped the link loop.
    #[error("run aborted after {processed} link(s): {source}")]
    Aborted {
        /// Links fully processed before the failure.
        processed: usize,
        /// The escalated driver error.
        #[source]
        source: DriverError,
    },
}
