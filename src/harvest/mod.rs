//! Run orchestration.
//!
//! A run fetches the listing page, extracts document links, and walks them in
//! page order through one [`DownloadDriver`]:
//!
//! ```text
//! probe ──Ok──────────────────────────────► download original
//!   ├──NotFound/Forbidden──► archive ──hit─► download snapshot
//!   │                           ├──miss───► skip
//!   │                           └──error──► skip
//!   └──Unreachable────────────────────────► skip
//! ```
//!
//! Per-link failures are recorded and the loop moves on. Only an unclassified
//! browser failure stops it. The driver is closed on every path once launched.

mod error;
mod report;

pub use error::HarvestError;
pub use report::{HarvestReport, LinkOutcome, LinkRecord};

use tracing::{debug, info, instrument, warn};

use crate::archive::{ArchiveSnapshot, DEFAULT_SNAPSHOT_BASE, WaybackResolver};
use crate::availability::{Availability, AvailabilityChecker};
use crate::config::HarvestSettings;
use crate::driver::{DownloadDriver, DriverError, ManualOpener, SessionLauncher};
use crate::fetch::{FetchResult, Fetcher};
use crate::links::{ResourceLink, extract_document_links};

/// Drives one harvest run.
#[derive(Debug)]
pub struct Harvester {
    settings: HarvestSettings,
    fetcher: Fetcher,
    checker: AvailabilityChecker,
    resolver: WaybackResolver,
}

impl Harvester {
    /// Builds the HTTP and archive clients for `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Setup`] or [`HarvestError::ArchiveSetup`] if a
    /// client cannot be built.
    pub fn new(settings: HarvestSettings) -> Result<Self, HarvestError> {
        let resolver = WaybackResolver::with_endpoint(
            settings.archive_endpoint.clone(),
            DEFAULT_SNAPSHOT_BASE,
            settings.http_timeouts(),
        )
        .map_err(|source| HarvestError::ArchiveSetup { source })?;
        Self::with_resolver(settings, resolver)
    }

    /// Builds the HTTP clients and uses `resolver` for archive lookups.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Setup`] if the HTTP client cannot be built.
    pub fn with_resolver(
        settings: HarvestSettings,
        resolver: WaybackResolver,
    ) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(settings.retry_policy(), settings.http_timeouts())
            .map_err(|source| HarvestError::Setup { source })?;
        let checker = AvailabilityChecker::new(fetcher.client().clone());
        Ok(Self {
            settings,
            fetcher,
            checker,
            resolver,
        })
    }

    /// Settings for this run.
    #[must_use]
    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    /// Runs the harvest with sessions from `launcher`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the listing page is unavailable, the
    /// output directory or browser session cannot be set up, or a browser
    /// failure aborts the loop. The browser session is closed in every case
    /// after it was launched.
    #[instrument(skip_all, fields(source = %self.settings.source_url))]
    pub async fn run(
        &self,
        launcher: &dyn SessionLauncher,
        opener: Box<dyn ManualOpener>,
    ) -> Result<HarvestReport, HarvestError> {
        let links = self.collect_links().await?;
        info!(count = links.len(), "Found document links");

        let output_dir = &self.settings.output_dir;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| HarvestError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;

        let mut driver =
            DownloadDriver::launch(launcher, output_dir, opener, self.settings.settle_delay())
                .await
                .map_err(|source| HarvestError::DriverLaunch { source })?;

        let result = self.process_links(&mut driver, links).await;

        if let Err(error) = driver.close().await {
            warn!(error = %error, "Browser session did not close cleanly");
        }

        let report = result?;
        info!(
            total = report.total(),
            downloaded = report.downloaded(),
            from_archive = report.from_archive(),
            archive_misses = report.archive_misses(),
            failed = report.failed(),
            "Harvest complete"
        );
        Ok(report)
    }

    async fn collect_links(&self) -> Result<Vec<ResourceLink>, HarvestError> {
        let url = self.settings.source_url.as_str();
        let body = match self.fetcher.fetch(url).await {
            FetchResult::Success { status: 200, body } => body,
            FetchResult::Success { status, .. } => {
                return Err(HarvestError::ListingStatus {
                    url: url.to_string(),
                    status,
                });
            }
            FetchResult::Failure(kind) => {
                return Err(HarvestError::ListingUnreachable {
                    url: url.to_string(),
                    kind,
                });
            }
        };
        Ok(extract_document_links(&body, url, &self.settings.extensions)?)
    }

    async fn process_links(
        &self,
        driver: &mut DownloadDriver,
        links: Vec<ResourceLink>,
    ) -> Result<HarvestReport, HarvestError> {
        let mut report = HarvestReport::default();
        for link in links {
            let outcome = match self.process_link(driver, &link).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    return Err(HarvestError::Aborted {
                        processed: report.total(),
                        source,
                    });
                }
            };
            info!(url = %link.url, outcome = %outcome, "Link processed");
            report.record(link, outcome);
        }
        Ok(report)
    }

    #[instrument(skip(self, driver, link), fields(url = %link.url, position = link.position))]
    async fn process_link(
        &self,
        driver: &mut DownloadDriver,
        link: &ResourceLink,
    ) -> Result<LinkOutcome, DriverError> {
        let availability = self.checker.check(&link.url).await;
        debug!(%availability, "Probed link");

        match availability {
            Availability::Ok => {
                let navigation = driver.navigate_and_download(&link.url).await?;
                Ok(LinkOutcome::from_navigation(navigation, None))
            }
            Availability::NotFound | Availability::Forbidden => {
                match self.resolver.resolve(&link.url).await {
                    Ok(ArchiveSnapshot::Found(snapshot)) => {
                        let navigation = driver.navigate_and_download(&snapshot.archive_url).await?;
                        Ok(LinkOutcome::from_navigation(navigation, Some(&snapshot)))
                    }
                    Ok(ArchiveSnapshot::NotFound) => Ok(LinkOutcome::SkippedArchiveMiss),
                    Err(error) => {
                        warn!(error = %error, "Archive lookup failed, skipping link");
                        Ok(LinkOutcome::SkippedArchiveError {
                            reason: error.to_string(),
                        })
                    }
                }
            }
            Availability::Unreachable => Ok(LinkOutcome::SkippedUnreachable),
        }
    }
}
