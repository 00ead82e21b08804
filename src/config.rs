//! Run settings and the TOML config file.
//!
//! [`HarvestSettings`] is the fully resolved configuration for one run. A
//! [`FileConfig`] carries the optional overrides read from
//! `config.toml`; the binary layers command-line values on top.
//!
//! Lookup order for the file:
//! 1. an explicit path (`--config`)
//! 2. `$XDG_CONFIG_HOME/letter-harvester/config.toml`
//! 3. `$HOME/.config/letter-harvester/config.toml`

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::archive::DEFAULT_CDX_ENDPOINT;
use crate::driver::{DEFAULT_DRIVER_STARTUP_TIMEOUT, DEFAULT_WEBDRIVER_URL, WebDriverSettings};
use crate::fetch::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts,
    RetryPolicy,
};
use crate::links::DEFAULT_EXTENSIONS;

/// Directory name under the user config root.
pub const CONFIG_DIR_NAME: &str = "letter-harvester";

/// Default listing page.
pub const DEFAULT_SOURCE_URL: &str = "https://finmasters.com/hedge-fund-letters-to-investors/";

/// Default download directory.
pub const DEFAULT_OUTPUT_DIR: &str = "pdfs/finmaster_all_letters";

/// Default delay between fetch attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Default wait after each browser download, in seconds.
pub const DEFAULT_SETTLE_SECS: u64 = 1;

/// Accepted range for `max_retries`.
pub const MAX_RETRIES_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

const MAX_DELAY_SECS: u64 = 600;
const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// TOML decoding error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Key name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted values.
        expected: String,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {path}")]
    Missing {
        /// Requested path.
        path: PathBuf,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    /// Listing page URL.
    pub source_url: String,
    /// Directory the browser saves into.
    pub output_dir: PathBuf,
    /// Total fetch attempts for the listing page.
    pub max_retries: u32,
    /// Delay between fetch attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Wait after each browser download, in seconds.
    pub download_settle_secs: u64,
    /// Recognized document extensions, without the dot.
    pub extensions: Vec<String>,
    /// WebDriver endpoint.
    pub webdriver_url: String,
    /// chromedriver binary to autostart.
    pub chromedriver_path: Option<PathBuf>,
    /// Run the browser without a window.
    pub headless: bool,
    /// Wayback CDX endpoint.
    pub archive_endpoint: String,
    /// HTTP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout, in seconds.
    pub read_timeout_secs: u64,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            download_settle_secs: DEFAULT_SETTLE_SECS,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            chromedriver_path: None,
            headless: false,
            archive_endpoint: DEFAULT_CDX_ENDPOINT.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl HarvestSettings {
    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("source_url", &self.source_url)?;
        validate_url("webdriver_url", &self.webdriver_url)?;
        validate_url("archive_endpoint", &self.archive_endpoint)?;
        if !MAX_RETRIES_RANGE.contains(&self.max_retries) {
            return Err(ConfigError::invalid(
                "max_retries",
                self.max_retries,
                "range 1..=10",
            ));
        }
        validate_delay("retry_delay_secs", self.retry_delay_secs)?;
        validate_delay("download_settle_secs", self.download_settle_secs)?;
        validate_timeout("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout("read_timeout_secs", self.read_timeout_secs)?;
        if self.extensions.is_empty() {
            return Err(ConfigError::invalid(
                "extensions",
                "[]",
                "at least one extension",
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains(['.', '/']))
        {
            return Err(ConfigError::invalid(
                "extensions",
                format!("{ext:?}"),
                "a bare extension such as \"pdf\"",
            ));
        }
        Ok(())
    }

    /// Retry policy for the listing page.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }

    /// HTTP timeouts shared by every client.
    #[must_use]
    pub fn http_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect_secs: self.connect_timeout_secs,
            read_secs: self.read_timeout_secs,
        }
    }

    /// Wait after each browser download.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.download_settle_secs)
    }

    /// WebDriver connection settings.
    #[must_use]
    pub fn webdriver_settings(&self) -> WebDriverSettings {
        WebDriverSettings {
            webdriver_url: self.webdriver_url.clone(),
            chromedriver_path: self.chromedriver_path.clone(),
            headless: self.headless,
            startup_timeout: DEFAULT_DRIVER_STARTUP_TIMEOUT,
        }
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::invalid(field, value, "an http(s) URL")),
    }
}

fn validate_delay(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > MAX_DELAY_SECS {
        return Err(ConfigError::invalid(field, value, "range 0..=600"));
    }
    Ok(())
}

fn validate_timeout(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !TIMEOUT_RANGE.contains(&value) {
        return Err(ConfigError::invalid(field, value, "range 1..=3600"));
    }
    Ok(())
}

/// Optional overrides read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Listing page URL.
    pub source_url: Option<String>,
    /// Download directory.
    pub output_dir: Option<PathBuf>,
    /// Total fetch attempts.
    pub max_retries: Option<u32>,
    /// Delay between attempts, in seconds.
    pub retry_delay_secs: Option<u64>,
    /// Wait after each download, in seconds.
    pub download_settle_secs: Option<u64>,
    /// Recognized document extensions.
    pub extensions: Option<Vec<String>>,
    /// WebDriver endpoint.
    pub webdriver_url: Option<String>,
    /// chromedriver binary to autostart.
    pub chromedriver_path: Option<PathBuf>,
    /// Headless browser.
    pub headless: Option<bool>,
    /// Wayback CDX endpoint.
    pub archive_endpoint: Option<String>,
    /// HTTP connect timeout, in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout, in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on syntax errors or unknown keys, and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the values that are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut merged = HarvestSettings::default();
        self.apply_to(&mut merged);
        merged.validate()
    }

    /// Overwrites `settings` with every value present in the file.
    pub fn apply_to(&self, settings: &mut HarvestSettings) {
        if let Some(source_url) = &self.source_url {
            settings.source_url.clone_from(source_url);
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir.clone_from(output_dir);
        }
        if let Some(max_retries) = self.max_retries {
            settings.max_retries = max_retries;
        }
        if let Some(delay) = self.retry_delay_secs {
            settings.retry_delay_secs = delay;
        }
        if let Some(settle) = self.download_settle_secs {
            settings.download_settle_secs = settle;
        }
        if let Some(extensions) = &self.extensions {
            settings.extensions.clone_from(extensions);
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            settings.webdriver_url.clone_from(webdriver_url);
        }
        if let Some(path) = &self.chromedriver_path {
            settings.chromedriver_path = Some(path.clone());
        }
        if let Some(headless) = self.headless {
            settings.headless = headless;
        }
        if let Some(endpoint) = &self.archive_endpoint {
            settings.archive_endpoint.clone_from(endpoint);
        }
        if let Some(connect) = self.connect_timeout_secs {
            settings.connect_timeout_secs = connect;
        }
        if let Some(read) = self.read_timeout_secs {
            settings.read_timeout_secs = read;
        }
    }
}

/// Result of looking for a config file.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was consulted, if any could be determined.
    pub path: Option<PathBuf>,
    /// Parsed contents when the file exists.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path from the environment.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// With `explicit` set the file must exist. Otherwise the default path is
/// used and an absent file yields an empty [`LoadedConfig`].
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, parsed or validated.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Some(path.to_path_buf())
        }
        None => resolve_default_config_path(),
    };

    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig { path, config: None });
    };

    let text = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_toml(path_ref, &text)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}
