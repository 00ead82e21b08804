//! Chrome capabilities for the download session.

use std::path::Path;

use serde_json::{Map, Value, json};

/// Command-line switches that relax certificate checks. Archived snapshots are
/// often served for domains whose certificates have since been reissued.
const RELAXED_TLS_ARGS: &[&str] = &[
    "--ignore-certificate-errors",
    "--ignore-ssl-errors",
    "--allow-insecure-localhost",
];

/// Builds W3C capabilities for a Chrome session that saves documents into
/// `download_dir` instead of rendering them.
///
/// `download_dir` should be absolute; Chrome resolves relative download
/// directories against its own working directory.
#[must_use]
pub fn chrome_capabilities(download_dir: &Path, headless: bool) -> Map<String, Value> {
    let prefs = json!({
        "download.default_directory": download_dir.to_string_lossy(),
        "download.prompt_for_download": false,
        "download.directory_upgrade": true,
        "plugins.always_open_pdf_externally": true,
    });

    let mut args: Vec<&str> = RELAXED_TLS_ARGS.to_vec();
    if headless {
        args.push("--headless=new");
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("acceptInsecureCerts".to_string(), json!(true));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "prefs": prefs, "args": args }),
    );
    caps
}
