pub mod episodes;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{OrganizeConfig, OrganizeMode};
use crate::error::{Error, Result};
use crate::fsops;
use crate::progress::ProgressReporter;

/// Why a candidate video was left at the top level.
#[derive(Debug)]
pub enum SkipReason {
    /// Name looks like a TV episode or season pack (downloads mode).
    Episodic,
    /// Below the minimum movie size (downloads mode).
    BelowThreshold { size_bytes: u64, min_bytes: u64 },
    /// The per-title folder already holds a file with this name.
    DestinationExists { dest: PathBuf },
    /// A non-directory entry occupies the folder name.
    FolderIsFile { folder: PathBuf },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Episodic => write!(f, "episodic name"),
            SkipReason::BelowThreshold {
                size_bytes,
                min_bytes,
            } => write!(
                f,
                "{} below the {} minimum",
                fsops::format_size(*size_bytes),
                fsops::format_size(*min_bytes)
            ),
            SkipReason::DestinationExists { dest } => {
                write!(f, "already exists at {}", dest.display())
            }
            SkipReason::FolderIsFile { folder } => {
                write!(f, "folder name taken by a file: {}", folder.display())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct OrganizeSummary {
    /// Candidate videos found at the top level.
    pub examined: usize,
    pub moved: usize,
    pub siblings_moved: usize,
    pub skipped_episodic: usize,
    pub skipped_small: usize,
    pub skipped_existing: usize,
    /// Non-fatal trouble: sibling moves that failed, occupied
    /// destinations, unreadable entries.
    pub warnings: usize,
    pub duration: Duration,
}

impl OrganizeSummary {
    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }
}

pub struct Organizer {
    config: OrganizeConfig,
}

impl Organizer {
    pub fn new(config: OrganizeConfig) -> Self {
        Self { config }
    }

    /// Fold qualifying top-level videos into same-named folders, taking
    /// same-stem companion files (subtitles, nfo, artwork) along.
    ///
    /// A primary video that cannot be moved aborts the run; a companion
    /// that cannot be moved is logged and counted as a warning.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<OrganizeSummary> {
        let start = Instant::now();

        let root = self
            .config
            .source_dir
            .clone()
            .ok_or_else(|| Error::InvalidConfig("organize.source_dir is not set".to_string()))?;
        if !root.is_dir() {
            return Err(Error::InvalidPath {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        let extra_patterns =
            episodes::compile_extra_patterns(&self.config.extra_episode_patterns)?;
        let min_bytes = self.config.min_movie_size_mb * 1024 * 1024;

        let mut summary = OrganizeSummary::default();
        let entries = self.list_top_level_files(&root, &mut summary)?;
        let candidates: Vec<&(PathBuf, u64)> = entries
            .iter()
            .filter(|(path, _)| self.is_video(path))
            .collect();
        summary.examined = candidates.len();

        info!(
            "Organizing {}: {} candidate video(s) among {} top-level file(s)",
            root.display(),
            candidates.len(),
            entries.len()
        );
        reporter.on_organize_start(&root, candidates.len());

        let mut relocated: HashSet<PathBuf> = HashSet::new();

        for (path, size) in candidates {
            // may have travelled along with an earlier video's companions
            if relocated.contains(path) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("Skipping file with non-UTF8 name: {}", path.display());
                summary.warnings += 1;
                continue;
            };

            if self.config.mode == OrganizeMode::Downloads {
                if episodes::is_episodic(stem, &extra_patterns) {
                    debug!("Leaving episodic file in place: {}", path.display());
                    summary.skipped_episodic += 1;
                    reporter.on_file_skipped(path, &SkipReason::Episodic);
                    continue;
                }
                if *size < min_bytes {
                    debug!(
                        "Leaving small file in place: {} ({})",
                        path.display(),
                        fsops::format_size(*size)
                    );
                    summary.skipped_small += 1;
                    reporter.on_file_skipped(
                        path,
                        &SkipReason::BelowThreshold {
                            size_bytes: *size,
                            min_bytes,
                        },
                    );
                    continue;
                }
            }

            let folder = root.join(stem);
            if folder.exists() && !folder.is_dir() {
                warn!(
                    "Folder name for {} is taken by a file, skipping",
                    path.display()
                );
                summary.warnings += 1;
                reporter.on_file_skipped(path, &SkipReason::FolderIsFile { folder });
                continue;
            }
            if !folder.exists() {
                fs::create_dir(&folder).map_err(|err| {
                    io::Error::new(
                        err.kind(),
                        format!("Error creating folder {}: {}", folder.display(), err),
                    )
                })?;
            }

            let Some(file_name) = path.file_name() else {
                continue;
            };
            let dest = folder.join(file_name);
            if dest.exists() {
                warn!(
                    "Not overwriting {}, leaving {} in place",
                    dest.display(),
                    path.display()
                );
                summary.skipped_existing += 1;
                summary.warnings += 1;
                reporter.on_file_skipped(path, &SkipReason::DestinationExists { dest });
                continue;
            }

            fsops::move_file(path, &dest).map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error moving {} to {}: {}", path.display(), dest.display(), err),
                )
            })?;
            summary.moved += 1;
            relocated.insert(path.clone());

            let siblings_moved =
                self.move_companions(path, stem, &folder, &entries, &mut relocated, &mut summary);
            summary.siblings_moved += siblings_moved;

            info!(
                "Moved {} into {} with {} companion(s)",
                path.display(),
                folder.display(),
                siblings_moved
            );
            reporter.on_file_moved(path, &folder, siblings_moved);
        }

        summary.duration = start.elapsed();
        info!(
            "Organize completed in {:.2}s: {} moved, {} companions, {} skipped, {} warning(s)",
            summary.duration.as_secs_f64(),
            summary.moved,
            summary.siblings_moved,
            summary.skipped_episodic + summary.skipped_small + summary.skipped_existing,
            summary.warnings,
        );
        reporter.on_organize_complete(&summary);
        Ok(summary)
    }

    /// Top-level regular files with their sizes, sorted by path for a
    /// deterministic processing order. Subdirectories and symlinks stay
    /// where they are.
    fn list_top_level_files(
        &self,
        root: &Path,
        summary: &mut OrganizeSummary,
    ) -> Result<Vec<(PathBuf, u64)>> {
        let read = fs::read_dir(root).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", root.display(), err),
            )
        })?;

        let mut entries: Vec<(PathBuf, u64)> = Vec::new();
        for entry_result in read {
            let entry = entry_result.map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error reading entry in {}: {}", root.display(), err),
                )
            })?;
            let path = entry.path();
            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => match entry.metadata() {
                    Ok(meta) => entries.push((path, meta.len())),
                    Err(err) => {
                        warn!("Could not stat {}: {}", path.display(), err);
                        summary.warnings += 1;
                    }
                },
                Ok(_) => {}
                Err(err) => {
                    warn!("Could not read file type of {}: {}", path.display(), err);
                    summary.warnings += 1;
                }
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn is_video(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .video_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Move every top-level file named `<stem>.<anything>` into the
    /// video's folder. Failures here never abort the run.
    fn move_companions(
        &self,
        video: &Path,
        stem: &str,
        folder: &Path,
        entries: &[(PathBuf, u64)],
        relocated: &mut HashSet<PathBuf>,
        summary: &mut OrganizeSummary,
    ) -> usize {
        let prefix = format!("{stem}.");
        let mut moved = 0usize;

        for (other, _) in entries {
            if other == video || relocated.contains(other) {
                continue;
            }
            let Some(name) = other.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }

            let dest = folder.join(name);
            if dest.exists() {
                warn!("Not overwriting companion {}", dest.display());
                summary.warnings += 1;
                continue;
            }
            match fsops::move_file(other, &dest) {
                Ok(()) => {
                    debug!("Moved companion {} into {}", other.display(), folder.display());
                    relocated.insert(other.clone());
                    moved += 1;
                }
                Err(err) => {
                    warn!("Could not move companion {}: {}", other.display(), err);
                    summary.warnings += 1;
                }
            }
        }
        moved
    }
}
