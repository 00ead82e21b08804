//! Wayback CDX payload parsing.
//!
//! Queries ask for `fl=timestamp,original` with `output=json`, so a reply is a
//! JSON array of string rows whose first row is the field header:
//!
//! ```text
//! [["timestamp","original"],
//!  ["20210304050607","https://example.com/b.pdf"]]
//! ```
//!
//! An empty body, `[]`, or a header-only array all mean "no capture".

use super::ArchiveError;

/// One capture row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CdxRecord {
    pub timestamp: String,
    pub original: String,
}

/// Parses a CDX JSON reply and returns its last (newest) record.
pub(crate) fn parse_newest_record(
    url: &str,
    body: &str,
) -> Result<Option<CdxRecord>, ArchiveError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(trimmed)
        .map_err(|e| ArchiveError::malformed(url, e.to_string()))?;

    let Some(row) = rows.iter().skip_while(|row| is_header(row)).last() else {
        return Ok(None);
    };
    match row.as_slice() {
        [timestamp, original, ..] if is_timestamp(timestamp) => Ok(Some(CdxRecord {
            timestamp: timestamp.clone(),
            original: original.clone(),
        })),
        _ => Err(ArchiveError::malformed(
            url,
            format!("unexpected CDX row: {row:?}"),
        )),
    }
}

fn is_header(row: &[String]) -> bool {
    row.first().is_some_and(|field| field == "timestamp")
}

fn is_timestamp(value: &str) -> bool {
    !value.is_empty() && value.len() <= 14 && value.bytes().all(|b| b.is_ascii_digit())
}
