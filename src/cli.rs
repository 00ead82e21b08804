//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use letter_harvester::archive::DEFAULT_CDX_ENDPOINT;
use letter_harvester::config::{
    DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_DELAY_SECS, DEFAULT_SETTLE_SECS, DEFAULT_SOURCE_URL,
};
use letter_harvester::driver::DEFAULT_WEBDRIVER_URL;
use letter_harvester::fetch::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_READ_TIMEOUT_SECS,
};

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0  every link was downloaded or has no archived copy
  1  run aborted, or links failed and nothing was downloaded
  2  some links failed, others were downloaded";

/// Download the document letters linked from a listing page.
///
/// Broken links (HTTP 404/403) fall back to the newest Wayback Machine
/// snapshot. Downloads run through a Chrome session driven over WebDriver.
#[derive(Parser, Debug, Clone)]
#[command(name = "letter-harvester")]
#[command(author, version, about, after_help = EXIT_CODES_HELP)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Config file (default: $XDG_CONFIG_HOME/letter-harvester/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listing page to harvest
    #[arg(short = 'u', long, value_name = "URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Directory the browser saves documents into
    #[arg(short = 'o', long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Total attempts for fetching the listing page (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Seconds between fetch attempts (0-600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_RETRY_DELAY_SECS, value_parser = clap::value_parser!(u64).range(0..=600))]
    pub retry_delay: u64,

    /// Seconds to wait after each download (0-600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_SETTLE_SECS, value_parser = clap::value_parser!(u64).range(0..=600))]
    pub settle: u64,

    /// Document extensions to collect, comma separated
    #[arg(short = 'e', long = "extension", value_name = "EXT", value_delimiter = ',', default_value = "pdf")]
    pub extensions: Vec<String>,

    /// WebDriver endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver_url: String,

    /// chromedriver binary to start for this run
    #[arg(long, value_name = "PATH")]
    pub chromedriver: Option<PathBuf>,

    /// Run Chrome without a window
    #[arg(long)]
    pub headless: bool,

    /// Wayback CDX endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_CDX_ENDPOINT)]
    pub archive_endpoint: String,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,
}
