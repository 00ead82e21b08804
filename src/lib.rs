//! Letter Harvester Library
//!
//! Downloads the document letters linked from a listing page. Broken links
//! (HTTP 404/403) fall back to the newest Wayback Machine snapshot; every
//! download goes through one browser session configured to save documents
//! into the output directory.
//!
//! # Architecture
//!
//! - [`fetch`] - HTTP GET with a fixed-delay attempt budget
//! - [`links`] - document link extraction from HTML
//! - [`availability`] - single-shot status probe
//! - [`archive`] - Wayback CDX lookup of the newest snapshot
//! - [`driver`] - owned browser session and navigation-failure classification
//! - [`harvest`] - the run loop tying the above together
//! - [`config`] - run settings and the TOML config file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod availability;
pub mod config;
pub mod driver;
pub mod exit;
pub mod fetch;
pub mod harvest;
pub mod links;
pub mod user_agent;

// Re-export commonly used types
pub use archive::{ArchiveError, ArchiveSnapshot, Snapshot, WaybackResolver};
pub use availability::{Availability, AvailabilityChecker};
pub use config::{ConfigError, FileConfig, HarvestSettings, LoadedConfig, load_config};
pub use driver::{
    BrowserSession, DownloadDriver, DriverError, DriverFailure, DriverState, DriverStatus,
    ManualOpener, NavigationOutcome, SessionLauncher, SystemOpener, WebDriverLauncher,
};
pub use exit::{ProcessExit, determine_exit_outcome, exit_for_report};
pub use fetch::{FetchError, FetchFailureKind, FetchResult, Fetcher, RetryPolicy};
pub use harvest::{HarvestError, HarvestReport, Harvester, LinkOutcome, LinkRecord};
pub use links::{LinkError, ResourceLink, extract_document_links};
