//! Document link extraction from the listing page.
//!
//! Every `<a href>` whose target path ends in one of the recognized document
//! extensions becomes a [`ResourceLink`], in page order. Relative hrefs are
//! resolved against the listing page URL. Duplicates are kept.

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Default recognized document extension.
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf"];

/// A document URL discovered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    /// Absolute URL to the document.
    pub url: String,
    /// The `href` attribute as written in the page.
    pub href: String,
    /// Zero-based position among extracted links.
    pub position: usize,
}

/// Errors raised while extracting links.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The listing page URL could not be parsed, so relative links cannot be resolved.
    #[error("invalid listing page URL '{url}': {source}")]
    InvalidBaseUrl {
        /// The offending URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The anchor selector failed to compile.
    #[error("invalid anchor selector: {reason}")]
    Selector {
        /// Selector parse failure description.
        reason: String,
    },
}

/// Extracts document links with any of `extensions` from `html`.
///
/// Extensions are compared case-insensitively against the URL path, so query
/// strings and fragments do not hide a `.pdf` target. Anchors whose href cannot
/// be resolved to an http(s) URL are skipped.
///
/// # Errors
///
/// Returns [`LinkError::InvalidBaseUrl`] when `base_url` is not a valid URL.
pub fn extract_document_links(
    html: &str,
    base_url: &str,
    extensions: &[String],
) -> Result<Vec<ResourceLink>, LinkError> {
    let base = Url::parse(base_url).map_err(|source| LinkError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })?;
    let selector = Selector::parse("a[href]").map_err(|e| LinkError::Selector {
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let Ok(resolved) = base.join(href) else {
            debug!(href, "Skipping unresolvable href");
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        if !has_document_extension(&resolved, extensions) {
            continue;
        }
        links.push(ResourceLink {
            url: resolved.to_string(),
            href: href.to_string(),
            position: links.len(),
        });
    }

    debug!(count = links.len(), "Extracted document links");
    Ok(links)
}

fn has_document_extension(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        !ext.is_empty() && path.ends_with(&format!(".{ext}"))
    })
}
