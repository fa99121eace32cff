use std::collections::HashSet;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::error::{Error, Result};

/// A candidate announce URL, tagged with its position in the fetched
/// lists so the output can preserve source order after concurrent
/// probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerEntry {
    pub url: String,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub entries: Vec<TrackerEntry>,
    /// Candidates dropped by the skip list.
    pub skipped: usize,
    /// Sources that could not be fetched. Fatal only when no source
    /// delivered at all.
    pub source_failures: usize,
}

/// Pull every configured list, splice them together and strip
/// duplicates and skip-listed entries. First-seen order wins.
pub fn fetch_candidates(client: &Client, config: &TrackerConfig) -> Result<FetchOutcome> {
    if config.source_urls.is_empty() {
        return Err(Error::InvalidConfig(
            "trackers.source_urls is empty".to_string(),
        ));
    }

    let mut raw_lines: Vec<String> = Vec::new();
    let mut source_failures = 0usize;
    for source in &config.source_urls {
        match fetch_list(client, source) {
            Ok(body) => {
                let lines = parse_tracker_list(&body);
                info!("Fetched {} entries from {}", lines.len(), source);
                raw_lines.extend(lines);
            }
            Err(reason) => {
                warn!("Could not fetch tracker list {}: {}", source, reason);
                source_failures += 1;
            }
        }
    }
    if source_failures == config.source_urls.len() {
        return Err(Error::NoUsableSource);
    }

    let skip: HashSet<&str> = config.skip_trackers.iter().map(String::as_str).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries: Vec<TrackerEntry> = Vec::new();
    let mut skipped = 0usize;
    for url in raw_lines {
        if !seen.insert(url.clone()) {
            continue;
        }
        if skip.contains(url.as_str()) {
            skipped += 1;
            continue;
        }
        entries.push(TrackerEntry {
            index: entries.len(),
            url,
        });
    }

    Ok(FetchOutcome {
        entries,
        skipped,
        source_failures,
    })
}

fn fetch_list(client: &Client, source: &str) -> std::result::Result<String, String> {
    let response = client.get(source).send().map_err(|err| err.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("status {status}"));
    }
    response.text().map_err(|err| err.to_string())
}

/// Lists are newline separated, usually with a blank line between
/// entries.
pub fn parse_tracker_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
