//! Browser-driven downloads.
//!
//! A [`DownloadDriver`] owns one browser session for the whole run. It is
//! acquired once before the link loop and released with [`DownloadDriver::close`],
//! which consumes it. Navigation failures are classified, so that benign ones
//! (cipher mismatch, download hand-off, missing element) never end the run.
//!
//! The browser itself sits behind [`BrowserSession`] and [`SessionLauncher`];
//! [`WebDriverLauncher`] is the Chrome implementation.

mod capabilities;
mod error;
mod opener;
mod process;
mod webdriver;

pub use capabilities::chrome_capabilities;
pub use error::{
    DriverError, DriverFailure, DriverStatus, FailureClass, classify_navigation_failure,
};
pub use opener::{ManualOpener, SystemOpener};
pub use process::{DEFAULT_DRIVER_PORT, DriverProcess};
pub use webdriver::{
    DEFAULT_DRIVER_STARTUP_TIMEOUT, DEFAULT_WEBDRIVER_URL, WebDriverLauncher, WebDriverSession,
    WebDriverSettings,
};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

/// Default wait after triggering a download.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// A browser session able to navigate to URLs.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the session to `url`.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverFailure>;

    /// Ends the session and releases its resources.
    async fn quit(&mut self) -> Result<(), DriverFailure>;
}

/// Creates browser sessions configured to save into a directory.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Starts a session whose downloads land in `download_dir` (absolute).
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>, DriverError>;
}

/// Lifecycle state of a [`DownloadDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No session yet.
    Uninitialized,
    /// Session open and idle.
    Ready,
    /// A navigation is in flight.
    Navigating,
    /// Session released.
    Closed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Navigating => "navigating",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// What a navigation accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The page loaded; the browser saved the document.
    Downloaded,
    /// The navigation was aborted because the browser turned it into a download.
    HandedOff,
    /// The server's TLS could not be negotiated.
    SkippedCipherMismatch,
    /// The URL was handed to the system browser.
    OpenedManually,
    /// The system browser could not be launched either.
    ManualOpenFailed,
}

impl NavigationOutcome {
    /// Returns true when the browser was asked to save the document.
    #[must_use]
    pub fn is_download(self) -> bool {
        matches!(self, Self::Downloaded | Self::HandedOff)
    }
}

/// Owned browser session for a run.
pub struct DownloadDriver {
    session: Box<dyn BrowserSession>,
    opener: Box<dyn ManualOpener>,
    settle_delay: Duration,
    download_dir: PathBuf,
    state: DriverState,
}

impl DownloadDriver {
    /// Creates `download_dir` if needed and launches a session saving into it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DownloadDir`] if the directory cannot be created,
    /// or the launcher's error if no session can be started.
    pub async fn launch(
        launcher: &dyn SessionLauncher,
        download_dir: &Path,
        opener: Box<dyn ManualOpener>,
        settle_delay: Duration,
    ) -> Result<Self, DriverError> {
        let dir_error = |source| DriverError::DownloadDir {
            path: download_dir.to_path_buf(),
            source,
        };
        tokio::fs::create_dir_all(download_dir)
            .await
            .map_err(dir_error)?;
        let download_dir = tokio::fs::canonicalize(download_dir)
            .await
            .map_err(dir_error)?;

        debug!(state = %DriverState::Uninitialized, "Launching browser session");
        let session = launcher.launch(&download_dir).await?;

        let driver = Self {
            session,
            opener,
            settle_delay,
            download_dir,
            state: DriverState::Ready,
        };
        debug!(
            from = %DriverState::Uninitialized,
            to = %driver.state,
            "Driver state changed"
        );
        Ok(driver)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Absolute directory the browser saves into.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Navigates to `url` so the browser saves it, then waits the settle delay.
    ///
    /// There is no confirmation that the file landed on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Navigation`] for failures the classifier does not
    /// recognize; the session may be unusable afterwards.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn navigate_and_download(
        &mut self,
        url: &str,
    ) -> Result<NavigationOutcome, DriverError> {
        self.transition(DriverState::Navigating);
        let result = self.session.navigate(url).await;
        self.transition(DriverState::Ready);

        let failure = match result {
            Ok(()) => {
                self.settle().await;
                info!("Download triggered");
                return Ok(NavigationOutcome::Downloaded);
            }
            Err(failure) => failure,
        };

        match classify_navigation_failure(&failure) {
            FailureClass::CipherMismatch => {
                warn!(failure = %failure, "TLS cipher mismatch, skipping link");
                Ok(NavigationOutcome::SkippedCipherMismatch)
            }
            FailureClass::DownloadHandoff => {
                self.settle().await;
                info!("Navigation handed off to download");
                Ok(NavigationOutcome::HandedOff)
            }
            FailureClass::ElementMissing => {
                warn!(failure = %failure, "Element missing, opening in system browser");
                match self.opener.open(url) {
                    Ok(()) => Ok(NavigationOutcome::OpenedManually),
                    Err(open_error) => {
                        warn!(error = %open_error, "Could not open system browser");
                        Ok(NavigationOutcome::ManualOpenFailed)
                    }
                }
            }
            FailureClass::Fatal => {
                error!(failure = %failure, "Unrecoverable browser failure");
                Err(DriverError::Navigation {
                    url: url.to_string(),
                    failure,
                })
            }
        }
    }

    /// Ends the browser session.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Close`] if the session did not shut down cleanly.
    /// The driver counts as closed either way.
    pub async fn close(mut self) -> Result<(), DriverError> {
        let result = self.session.quit().await;
        self.transition(DriverState::Closed);
        info!("Browser session closed");
        result.map_err(|failure| DriverError::Close { failure })
    }

    async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = %self.state, to = %next, "Driver state changed");
        self.state = next;
    }
}

impl fmt::Debug for DownloadDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadDriver")
            .field("download_dir", &self.download_dir)
            .field("settle_delay", &self.settle_delay)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Drop for DownloadDriver {
    fn drop(&mut self) {
        if self.state != DriverState::Closed {
            warn!(state = %self.state, "Download driver dropped without close");
        }
    }
}
