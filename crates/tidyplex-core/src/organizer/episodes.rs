//! Episodic-name detection for downloads mode.
//!
//! Heuristic, not a parser: the organizer only needs to know whether a
//! name looks like a TV episode or season pack so it can leave it for
//! the dedicated show tooling. Names are normalized (dots, underscores
//! and dashes become spaces) before matching, so `Show.S01E02` and
//! `Show S01E02` behave the same.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static EPISODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // S01E02, s1e2, S01E01E02 multi-episode
        r"(?i)\bs\d{1,2} ?e\d{1,3}(?: ?e\d{1,3})*\b",
        // 1x01 style
        r"(?i)\b\d{1,2}x\d{2,3}\b",
        // verbose "Season 1" / "Season 1 Episode 2" and season packs
        r"(?i)\bseason ?\d{1,2}\b",
        r"(?i)\bepisode ?\d{1,3}\b",
        // daily shows: 2026 01 07 after normalization
        r"\b(?:19|20)\d{2} \d{2} \d{2}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Compile user-supplied patterns from the config. A bad pattern is a
/// configuration error, reported before any file is touched.
pub fn compile_extra_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| Error::InvalidPattern {
                pattern: pattern.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

/// True when the (extension-less) file name looks episodic. Plain year
/// tags like `Movie 1984` or `Blade Runner 2049` do not trip it.
pub fn is_episodic(stem: &str, extra_patterns: &[Regex]) -> bool {
    let cleaned = stem.replace(['.', '_', '-'], " ");

    EPISODE_PATTERNS
        .iter()
        .chain(extra_patterns.iter())
        .any(|pattern| pattern.is_match(&cleaned))
}
