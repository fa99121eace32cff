use std::path::Path;

use crate::config::PruneAction;
use crate::organizer::{OrganizeSummary, SkipReason};
use crate::pruner::PruneSummary;
use crate::trackers::{ProbeOutcome, ProbeSummary};

/// Trait for reporting pipeline progress.
///
/// The CLI implements it with colored per-item lines and an indicatif
/// bar for the probe phase. All methods have default no-op
/// implementations, so library callers only hook what they need.
pub trait ProgressReporter: Send + Sync {
    fn on_organize_start(&self, _root: &Path, _candidates: usize) {}
    fn on_file_moved(&self, _file: &Path, _folder: &Path, _siblings_moved: usize) {}
    fn on_file_skipped(&self, _file: &Path, _reason: &SkipReason) {}
    fn on_organize_complete(&self, _summary: &OrganizeSummary) {}

    fn on_prune_start(&self, _root: &Path, _candidates: usize) {}
    fn on_dir_kept(&self, _dir: &Path, _size_bytes: u64) {}
    fn on_dir_pruned(&self, _dir: &Path, _size_bytes: u64, _action: PruneAction) {}
    fn on_dir_failed(&self, _dir: &Path, _error: &str) {}
    fn on_prune_complete(&self, _summary: &PruneSummary) {}

    fn on_fetch_start(&self, _sources: usize) {}
    fn on_fetch_complete(&self, _candidates: usize, _skipped: usize) {}
    fn on_probe_start(&self, _total: usize) {}
    fn on_tracker_probed(&self, _outcome: &ProbeOutcome) {}
    fn on_probe_complete(&self, _summary: &ProbeSummary) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
