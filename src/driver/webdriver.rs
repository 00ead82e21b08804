//! fantoccini-backed Chrome sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder};
use tracing::{debug, info, warn};

use super::capabilities::chrome_capabilities;
use super::process::DriverProcess;
use super::{BrowserSession, DriverError, DriverFailure, DriverStatus, SessionLauncher};

/// Default WebDriver endpoint (a local chromedriver).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// How long an autostarted chromedriver gets to open its port.
pub const DEFAULT_DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// WebDriver endpoint URL.
    pub webdriver_url: String,
    /// chromedriver binary to spawn; `None` connects to an already-running driver.
    pub chromedriver_path: Option<PathBuf>,
    /// Run Chrome without a window.
    pub headless: bool,
    /// Startup wait for an autostarted driver.
    pub startup_timeout: Duration,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            chromedriver_path: None,
            headless: false,
            startup_timeout: DEFAULT_DRIVER_STARTUP_TIMEOUT,
        }
    }
}

/// Launches Chrome sessions through WebDriver.
#[derive(Debug, Clone, Default)]
pub struct WebDriverLauncher {
    settings: WebDriverSettings,
}

impl WebDriverLauncher {
    /// Creates a launcher.
    #[must_use]
    pub fn new(settings: WebDriverSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>, DriverError> {
        let endpoint = self.settings.webdriver_url.as_str();

        let process = match &self.settings.chromedriver_path {
            Some(binary) => Some(
                DriverProcess::spawn(binary, endpoint, self.settings.startup_timeout).await?,
            ),
            None => None,
        };

        let capabilities = chrome_capabilities(download_dir, self.settings.headless);
        debug!(endpoint, headless = self.settings.headless, "Opening browser session");

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(endpoint)
            .await
            .map_err(|e| DriverError::session_start(endpoint, e.to_string()))?;

        info!(
            endpoint,
            autostarted = process.as_ref().map(DriverProcess::port),
            download_dir = %download_dir.display(),
            "Browser session ready"
        );
        Ok(Box::new(WebDriverSession {
            client: Some(client),
            process,
        }))
    }
}

/// A live Chrome session, plus the driver process when this run started it.
pub struct WebDriverSession {
    client: Option<Client>,
    process: Option<DriverProcess>,
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverFailure> {
        let Some(client) = self.client.as_ref() else {
            return Err(DriverFailure::new(
                DriverStatus::InvalidSession,
                "session already closed",
            ));
        };
        client.goto(url).await.map_err(failure_from_cmd_error)
    }

    async fn quit(&mut self) -> Result<(), DriverFailure> {
        let closed = match self.client.take() {
            Some(client) => client.close().await.map_err(failure_from_cmd_error),
            None => Ok(()),
        };
        if let Some(process) = self.process.take() {
            process.shutdown();
        }
        if let Err(failure) = &closed {
            warn!(failure = %failure, "Browser session did not close cleanly");
        }
        closed
    }
}

fn failure_from_cmd_error(error: CmdError) -> DriverFailure {
    match error {
        CmdError::Standard(wd) => {
            DriverFailure::new(status_from_w3c(&wd.error), wd.message.into_owned())
        }
        other => DriverFailure::new(DriverStatus::Transport, other.to_string()),
    }
}

fn status_from_w3c(status: &ErrorStatus) -> DriverStatus {
    match status {
        ErrorStatus::NoSuchElement => DriverStatus::NoSuchElement,
        ErrorStatus::InsecureCertificate => DriverStatus::InsecureCertificate,
        ErrorStatus::InvalidSessionId => DriverStatus::InvalidSession,
        ErrorStatus::SessionNotCreated => DriverStatus::SessionNotCreated,
        ErrorStatus::Timeout => DriverStatus::Timeout,
        ErrorStatus::UnknownError => DriverStatus::UnknownError,
        _ => DriverStatus::Other,
    }
}
