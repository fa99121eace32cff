use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use glob::Pattern;
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::config::{PruneAction, PruneConfig};
use crate::error::{Error, Result};
use crate::fsops;
use crate::progress::ProgressReporter;

#[derive(Debug, Default)]
pub struct PruneSummary {
    /// Subdirectories that were sized.
    pub examined: usize,
    /// Subdirectories protected by an exclude pattern.
    pub excluded: usize,
    pub kept: usize,
    /// Recycled or deleted, depending on the configured action.
    pub pruned: usize,
    pub failed: usize,
    pub reclaimed_bytes: u64,
    pub duration: Duration,
}

impl PruneSummary {
    pub fn has_warnings(&self) -> bool {
        self.failed > 0
    }
}

pub struct Pruner {
    config: PruneConfig,
}

impl Pruner {
    pub fn new(config: PruneConfig) -> Self {
        Self { config }
    }

    /// Recycle or delete top-level subdirectories whose recursive size
    /// is below the threshold. A folder that cannot be moved or removed
    /// is logged and counted; the run carries on with the rest.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<PruneSummary> {
        let start = Instant::now();

        let root = self
            .config
            .root_dir
            .clone()
            .ok_or_else(|| Error::InvalidConfig("prune.root_dir is not set".to_string()))?;
        if !root.is_dir() {
            return Err(Error::InvalidPath {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        let exclude_patterns = compile_globs(&self.config.exclude_patterns)?;
        let recycle_dir = self.prepare_recycle_dir(&root)?;
        let threshold_bytes = self.config.threshold_kb * 1024;

        let mut summary = PruneSummary::default();
        let candidates = self.list_subdirectories(&root, &exclude_patterns, &mut summary)?;
        summary.examined = candidates.len();

        info!(
            "Pruning {}: {} candidate folder(s), threshold {}",
            root.display(),
            candidates.len(),
            fsops::format_size(threshold_bytes)
        );
        reporter.on_prune_start(&root, candidates.len());

        // Sizing only reads; safe to fan out before any folder is touched.
        let mut sized: Vec<(PathBuf, u64)> = candidates
            .into_par_iter()
            .map(|dir| {
                let size = fsops::dir_size(&dir);
                (dir, size)
            })
            .collect();
        sized.sort();

        for (dir, size) in sized {
            if size >= threshold_bytes {
                debug!("Keeping {} ({})", dir.display(), fsops::format_size(size));
                summary.kept += 1;
                reporter.on_dir_kept(&dir, size);
                continue;
            }

            let outcome = match self.config.action {
                // prepare_recycle_dir guarantees the bin in recycle mode,
                // and read_dir children always carry a final component
                PruneAction::Recycle => match (&recycle_dir, dir.file_name()) {
                    (Some(bin), Some(name)) => {
                        fsops::move_dir(&dir, &unique_destination(bin, name))
                    }
                    _ => Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        "recycle destination unavailable",
                    )),
                },
                PruneAction::Delete => fs::remove_dir_all(&dir),
            };

            match outcome {
                Ok(()) => {
                    info!(
                        "{} {} ({})",
                        match self.config.action {
                            PruneAction::Recycle => "Recycled",
                            PruneAction::Delete => "Deleted",
                        },
                        dir.display(),
                        fsops::format_size(size)
                    );
                    summary.pruned += 1;
                    summary.reclaimed_bytes += size;
                    reporter.on_dir_pruned(&dir, size, self.config.action);
                }
                Err(err) => {
                    error!("Could not prune {}: {}", dir.display(), err);
                    summary.failed += 1;
                    reporter.on_dir_failed(&dir, &err.to_string());
                }
            }
        }

        summary.duration = start.elapsed();
        info!(
            "Prune completed in {:.2}s: {} pruned ({} reclaimed), {} kept, {} excluded, {} failed",
            summary.duration.as_secs_f64(),
            summary.pruned,
            fsops::format_size(summary.reclaimed_bytes),
            summary.kept,
            summary.excluded,
            summary.failed,
        );
        reporter.on_prune_complete(&summary);
        Ok(summary)
    }

    /// In recycle mode the destination must exist and must not sit
    /// inside the pruned root, or a run would eat its own recycle bin.
    fn prepare_recycle_dir(&self, root: &Path) -> Result<Option<PathBuf>> {
        if self.config.action != PruneAction::Recycle {
            return Ok(None);
        }
        let recycle_dir = self.config.recycle_dir.clone().ok_or_else(|| {
            Error::InvalidConfig(
                "prune.recycle_dir is required when prune.action is \"recycle\"".to_string(),
            )
        })?;
        fs::create_dir_all(&recycle_dir).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!(
                    "Error creating recycle directory {}: {}",
                    recycle_dir.display(),
                    err
                ),
            )
        })?;

        let root_canonical = fs::canonicalize(root)?;
        let recycle_canonical = fs::canonicalize(&recycle_dir)?;
        if recycle_canonical.starts_with(&root_canonical) {
            return Err(Error::InvalidConfig(format!(
                "prune.recycle_dir {} lies inside prune.root_dir {}",
                recycle_dir.display(),
                root.display()
            )));
        }
        Ok(Some(recycle_dir))
    }

    /// Immediate subdirectories of the root. Symlinked directories are
    /// never candidates, excluded names are counted and left alone.
    fn list_subdirectories(
        &self,
        root: &Path,
        exclude_patterns: &[Pattern],
        summary: &mut PruneSummary,
    ) -> Result<Vec<PathBuf>> {
        let read = fs::read_dir(root).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", root.display(), err),
            )
        })?;

        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry_result in read {
            let entry = entry_result.map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error reading entry in {}: {}", root.display(), err),
                )
            })?;
            let file_type = entry.file_type().map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error reading file type of {:?}: {}", entry.path(), err),
                )
            })?;
            if !file_type.is_dir() || file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            let name = entry.file_name();
            let name_lossy = name.to_string_lossy();
            if exclude_patterns
                .iter()
                .any(|pattern| pattern.matches(&name_lossy))
            {
                debug!("Excluded from pruning: {}", path.display());
                summary.excluded += 1;
                continue;
            }
            dirs.push(path);
        }
        Ok(dirs)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|err| Error::InvalidPattern {
                pattern: pattern.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

/// First free name in the recycle directory: the folder's own name,
/// then `name-1`, `name-2`, ...
fn unique_destination(recycle_dir: &Path, name: &OsStr) -> PathBuf {
    let mut dest = recycle_dir.join(name);
    let mut counter = 1u32;
    while dest.exists() {
        let mut suffixed = name.to_os_string();
        suffixed.push(format!("-{counter}"));
        dest = recycle_dir.join(&suffixed);
        counter += 1;
    }
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unique_destination_skips_taken_names() {
        let bin = tempdir().unwrap();
        fs::create_dir(bin.path().join("Leftovers")).unwrap();
        fs::create_dir(bin.path().join("Leftovers-1")).unwrap();

        let dest = unique_destination(bin.path(), OsStr::new("Leftovers"));

        assert_eq!(dest, bin.path().join("Leftovers-2"));
    }

    #[test]
    fn test_unique_destination_prefers_plain_name() {
        let bin = tempdir().unwrap();
        let dest = unique_destination(bin.path(), OsStr::new("Fresh"));
        assert_eq!(dest, bin.path().join("Fresh"));
    }

    #[test]
    fn test_compile_globs_rejects_bad_pattern() {
        let result = compile_globs(&["[".to_string()]);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }
}
