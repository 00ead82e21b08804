use anyhow::{Context, Result};
use letter_harvester::config::load_config;
use letter_harvester::driver::{SystemOpener, WebDriverLauncher};
use letter_harvester::exit::{ProcessExit, exit_for_report};
use letter_harvester::harvest::Harvester;
use tracing::{debug, info};

use crate::app::{config_manager, terminal};

pub(crate) async fn run_harvester() -> Result<ProcessExit> {
    let (args, sources) = config_manager::parse_cli_with_sources();

    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet), no_color);
    debug!(?args, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        info!(path = %path.display(), "Loaded config file");
    }

    let settings = config_manager::resolve_settings(&args, &sources, loaded.config.as_ref())?;
    info!(
        source = %settings.source_url,
        output_dir = %settings.output_dir.display(),
        "Letter harvester starting"
    );

    let launcher = WebDriverLauncher::new(settings.webdriver_settings());
    let harvester = Harvester::new(settings)?;
    let report = harvester
        .run(&launcher, Box::new(SystemOpener))
        .await
        .context("Harvest aborted")?;

    Ok(exit_for_report(&report))
}
