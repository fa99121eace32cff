use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use tidyplex_core::config::PruneAction;
use tidyplex_core::fsops::format_size;
use tidyplex_core::organizer::{OrganizeSummary, SkipReason};
use tidyplex_core::pruner::PruneSummary;
use tidyplex_core::trackers::{ProbeOutcome, ProbeSummary};
use tidyplex_core::ProgressReporter;

/// CLI progress reporter.
///
/// - Organize and prune phases: one colored audit line per touched item
/// - Tracker fetch: spinner (list sizes unknown upfront)
/// - Probe phase: progress bar, with audit lines routed through it
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    /// Print without tearing an active progress bar.
    fn println(&self, line: String) {
        let guard = self.bar.lock().unwrap();
        match guard.as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ProgressReporter for CliReporter {
    fn on_organize_start(&self, root: &Path, candidates: usize) {
        println!(
            "Organizing {} ({} candidate videos)",
            root.display().to_string().bold(),
            candidates
        );
    }

    fn on_file_moved(&self, file: &Path, folder: &Path, siblings_moved: usize) {
        let name = display_name(file);
        let folder_name = display_name(folder);
        if siblings_moved > 0 {
            self.println(format!(
                "  {} {} -> {}/ (+{} companions)",
                "moved".green(),
                name,
                folder_name,
                siblings_moved
            ));
        } else {
            self.println(format!("  {} {} -> {}/", "moved".green(), name, folder_name));
        }
    }

    fn on_file_skipped(&self, file: &Path, reason: &SkipReason) {
        self.println(format!(
            "  {} {} ({})",
            "skip".yellow(),
            display_name(file),
            reason
        ));
    }

    fn on_organize_complete(&self, summary: &OrganizeSummary) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Organize complete: {} moved, {} companions, {} skipped, {} warnings in {:.2}s",
            summary.moved,
            summary.siblings_moved,
            summary.skipped_episodic + summary.skipped_small + summary.skipped_existing,
            summary.warnings,
            summary.duration.as_secs_f64()
        );
    }

    fn on_prune_start(&self, root: &Path, candidates: usize) {
        println!(
            "Pruning {} ({} candidate folders)",
            root.display().to_string().bold(),
            candidates
        );
    }

    fn on_dir_pruned(&self, dir: &Path, size_bytes: u64, action: PruneAction) {
        let verb = match action {
            PruneAction::Recycle => "recycled".cyan(),
            PruneAction::Delete => "deleted".red(),
        };
        self.println(format!(
            "  {} {} ({})",
            verb,
            display_name(dir),
            format_size(size_bytes)
        ));
    }

    fn on_dir_failed(&self, dir: &Path, error: &str) {
        self.println(format!(
            "  {} {}: {}",
            "failed".red(),
            display_name(dir),
            error
        ));
    }

    fn on_prune_complete(&self, summary: &PruneSummary) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Prune complete: {} pruned ({} reclaimed), {} kept, {} failed in {:.2}s",
            summary.pruned,
            format_size(summary.reclaimed_bytes),
            summary.kept,
            summary.failed,
            summary.duration.as_secs_f64()
        );
    }

    fn on_fetch_start(&self, sources: usize) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Fetching {} tracker list(s)...", sources));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_fetch_complete(&self, candidates: usize, skipped: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Fetched {} candidate trackers ({} skip-listed)",
            candidates, skipped
        );
    }

    fn on_probe_start(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Probing [{bar:30.cyan/dim}] {pos}/{len} trackers",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_tracker_probed(&self, outcome: &ProbeOutcome) {
        {
            let guard = self.bar.lock().unwrap();
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
            }
        }
        match outcome.latency() {
            Some(latency) => self.println(format!(
                "  {} {} ({} ms)",
                "live".green(),
                outcome.url,
                latency.as_millis()
            )),
            None => self.println(format!(
                "  {} {} ({})",
                "dead".red(),
                outcome.url,
                outcome.status
            )),
        }
    }

    fn on_probe_complete(&self, summary: &ProbeSummary) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Probe complete: {}/{} alive, {} saved in {:.2}s",
            summary.alive,
            summary.probed,
            summary.written,
            summary.duration.as_secs_f64()
        );
        if summary.run_timed_out {
            eprintln!(
                "  \x1b[33m!\x1b[0m Run deadline passed, {} probe(s) abandoned",
                summary.abandoned
            );
        }
    }
}
