//! Configuration lifecycle: parse CLI, load file config, merge into run settings.
//!
//! Precedence per key: command line, then config file, then built-in default.

use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use letter_harvester::config::{FileConfig, HarvestSettings};

use crate::cli::Args;

/// Which settings were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) source_url: bool,
    pub(crate) output_dir: bool,
    pub(crate) max_retries: bool,
    pub(crate) retry_delay: bool,
    pub(crate) settle: bool,
    pub(crate) extensions: bool,
    pub(crate) webdriver_url: bool,
    pub(crate) chromedriver: bool,
    pub(crate) headless: bool,
    pub(crate) archive_endpoint: bool,
    pub(crate) connect_timeout: bool,
    pub(crate) read_timeout: bool,
}

impl CliValueSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            source_url: is_commandline_value(matches, "source_url"),
            output_dir: is_commandline_value(matches, "output_dir"),
            max_retries: is_commandline_value(matches, "max_retries"),
            retry_delay: is_commandline_value(matches, "retry_delay"),
            settle: is_commandline_value(matches, "settle"),
            extensions: is_commandline_value(matches, "extensions"),
            webdriver_url: is_commandline_value(matches, "webdriver_url"),
            chromedriver: is_commandline_value(matches, "chromedriver"),
            headless: is_commandline_value(matches, "headless"),
            archive_endpoint: is_commandline_value(matches, "archive_endpoint"),
            connect_timeout: is_commandline_value(matches, "connect_timeout"),
            read_timeout: is_commandline_value(matches, "read_timeout"),
        }
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Parses the process arguments, exiting with clap's message on error.
pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    parse_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
}

/// Parses `argv` and records which values were explicit.
pub(crate) fn parse_from<I, T>(argv: I) -> Result<(Args, CliValueSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(argv)?;
    let args = Args::from_arg_matches(&matches)?;
    Ok((args, CliValueSources::from_matches(&matches)))
}

/// Layers file config and explicit CLI values over the defaults, then
/// validates the result.
pub(crate) fn resolve_settings(
    args: &Args,
    sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<HarvestSettings> {
    let mut settings = HarvestSettings::default();
    if let Some(file_config) = file_config {
        file_config.apply_to(&mut settings);
    }

    if sources.source_url {
        settings.source_url.clone_from(&args.source_url);
    }
    if sources.output_dir {
        settings.output_dir.clone_from(&args.output_dir);
    }
    if sources.max_retries {
        settings.max_retries = args.max_retries;
    }
    if sources.retry_delay {
        settings.retry_delay_secs = args.retry_delay;
    }
    if sources.settle {
        settings.download_settle_secs = args.settle;
    }
    if sources.extensions {
        settings.extensions.clone_from(&args.extensions);
    }
    if sources.webdriver_url {
        settings.webdriver_url.clone_from(&args.webdriver_url);
    }
    if sources.chromedriver {
        settings.chromedriver_path.clone_from(&args.chromedriver);
    }
    if sources.headless {
        settings.headless = args.headless;
    }
    if sources.archive_endpoint {
        settings.archive_endpoint.clone_from(&args.archive_endpoint);
    }
    if sources.connect_timeout {
        settings.connect_timeout_secs = args.connect_timeout;
    }
    if sources.read_timeout {
        settings.read_timeout_secs = args.read_timeout;
    }

    settings
        .validate()
        .context("Invalid settings after merging command line and config file")?;
    Ok(settings)
}
