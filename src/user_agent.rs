//! User-Agent strings for listing, probe and archive HTTP traffic.
//!
//! Listing and availability traffic identifies the tool. Archive queries use a
//! randomized desktop Chrome identity.

use rand::Rng;
use rand::seq::SliceRandom;

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/letter-harvester";

/// Platform tokens used when composing a randomized Chrome User-Agent.
const CHROME_PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; CrOS x86_64 14541.0.0",
];

/// Inclusive range of Chrome major versions to pick from.
const CHROME_MAJOR_VERSIONS: std::ops::RangeInclusive<u32> = 114..=131;

/// Default User-Agent for listing page and availability probe requests.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("letter-harvester/{version} (document-archival-tool; +{PROJECT_UA_URL})")
}

/// Generates a randomized desktop Chrome User-Agent.
///
/// Every call picks a platform and a Chrome build independently, so repeated
/// archive queries do not share one fingerprint.
#[must_use]
pub fn random_chrome_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = CHROME_PLATFORMS
        .choose(&mut rng)
        .copied()
        .unwrap_or(CHROME_PLATFORMS[0]);
    let major = rng.gen_range(CHROME_MAJOR_VERSIONS);
    let build = rng.gen_range(5000..=6800);
    let patch = rng.gen_range(0..=200);
    format!(
        "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/{major}.0.{build}.{patch} Safari/537.36"
    )
}
