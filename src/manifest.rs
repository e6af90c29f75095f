use std::time::Duration;

use tracing::{debug, info};

use crate::error::ScanError;

/// One `<repository-url> <revision>` line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub url: String,
    pub revision: String,
}

/// Download the raw manifest bytes. A zero `timeout` means no limit.
pub async fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>, ScanError> {
    let wrap = |source: reqwest::Error| ScanError::ManifestFetch {
        url: url.to_string(),
        source,
    };

    let mut builder = reqwest::Client::builder();
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().map_err(wrap)?;

    info!(url, "fetching manifest");
    let body = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(wrap)?
        .bytes()
        .await
        .map_err(wrap)?;
    debug!(url, bytes = body.len(), "manifest downloaded");

    Ok(body.to_vec())
}

/// Parse every non-blank line, stopping at the first malformed one.
pub fn parse(data: &[u8]) -> Result<Vec<ManifestEntry>, ScanError> {
    entries(data).collect()
}

/// One result per non-blank line, in input order.
pub fn entries(data: &[u8]) -> impl Iterator<Item = Result<ManifestEntry, ScanError>> {
    let text = String::from_utf8_lossy(data).into_owned();
    let lines: Vec<(usize, String)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect();

    lines
        .into_iter()
        .map(|(line_number, line)| parse_line(line_number, &line))
}

fn parse_line(line_number: usize, line: &str) -> Result<ManifestEntry, ScanError> {
    let malformed = || ScanError::MalformedManifestLine {
        line_number,
        line: line.to_string(),
    };

    let trimmed = line.trim();
    let (url, rest) = trimmed.split_once(char::is_whitespace).ok_or_else(malformed)?;
    // Everything after the first whitespace run is the revision.
    let revision = rest.trim();
    if revision.is_empty() {
        return Err(malformed());
    }

    Ok(ManifestEntry {
        url: url.to_string(),
        revision: revision.to_string(),
    })
}
