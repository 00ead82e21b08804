//! Per-link outcomes and run summary.

use std::fmt;

use crate::archive::Snapshot;
use crate::driver::NavigationOutcome;
use crate::links::ResourceLink;

/// What happened to one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The original URL was handed to the browser for download.
    Downloaded,
    /// The newest archive snapshot was handed to the browser for download.
    DownloadedFromArchive {
        /// Snapshot URL that was downloaded.
        snapshot: String,
    },
    /// The URL was opened in the system browser instead.
    OpenedManually,
    /// Broken link with no archive capture.
    SkippedArchiveMiss,
    /// The URL could not be reached at all.
    SkippedUnreachable,
    /// The archive lookup failed.
    SkippedArchiveError {
        /// Error description.
        reason: String,
    },
    /// The server's TLS could not be negotiated by the browser.
    SkippedCipherMismatch,
    /// Neither the automated nor the system browser could open the URL.
    SkippedManualOpenFailed,
}

impl LinkOutcome {
    /// Maps a driver navigation result, downloaded from `snapshot` when set.
    #[must_use]
    pub fn from_navigation(outcome: NavigationOutcome, snapshot: Option<&Snapshot>) -> Self {
        match outcome {
            NavigationOutcome::Downloaded | NavigationOutcome::HandedOff => match snapshot {
                Some(snapshot) => Self::DownloadedFromArchive {
                    snapshot: snapshot.archive_url.clone(),
                },
                None => Self::Downloaded,
            },
            NavigationOutcome::SkippedCipherMismatch => Self::SkippedCipherMismatch,
            NavigationOutcome::OpenedManually => Self::OpenedManually,
            NavigationOutcome::ManualOpenFailed => Self::SkippedManualOpenFailed,
        }
    }

    /// Returns true when the browser was asked to save a copy.
    #[must_use]
    pub fn is_download(&self) -> bool {
        matches!(self, Self::Downloaded | Self::DownloadedFromArchive { .. })
    }

    /// Returns true for non-fatal failures that leave the link without a copy.
    ///
    /// An archive miss is an expected outcome, not a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::OpenedManually
                | Self::SkippedUnreachable
                | Self::SkippedArchiveError { .. }
                | Self::SkippedCipherMismatch
                | Self::SkippedManualOpenFailed
        )
    }

    /// Stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::DownloadedFromArchive { .. } => "downloaded_from_archive",
            Self::OpenedManually => "opened_manually",
            Self::SkippedArchiveMiss => "skipped_archive_miss",
            Self::SkippedUnreachable => "skipped_unreachable",
            Self::SkippedArchiveError { .. } => "skipped_archive_error",
            Self::SkippedCipherMismatch => "skipped_cipher_mismatch",
            Self::SkippedManualOpenFailed => "skipped_manual_open_failed",
        }
    }
}

impl fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// The link as extracted.
    pub link: ResourceLink,
    /// Its outcome.
    pub outcome: LinkOutcome,
}

/// Ordered outcomes of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    records: Vec<LinkRecord>,
}

impl HarvestReport {
    /// Appends an outcome.
    pub fn record(&mut self, link: ResourceLink, outcome: LinkOutcome) {
        self.records.push(LinkRecord { link, outcome });
    }

    /// Outcomes in page order.
    #[must_use]
    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    /// Links processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Links handed to the browser for download, original or archived.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(LinkOutcome::is_download)
    }

    /// Links downloaded from an archive snapshot.
    #[must_use]
    pub fn from_archive(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::DownloadedFromArchive { .. }))
    }

    /// Broken links the archive never captured.
    #[must_use]
    pub fn archive_misses(&self) -> usize {
        self.count(|o| matches!(o, LinkOutcome::SkippedArchiveMiss))
    }

    /// Links that failed without ending the run.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(LinkOutcome::is_failure)
    }

    fn count(&self, predicate: impl Fn(&LinkOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }
}
