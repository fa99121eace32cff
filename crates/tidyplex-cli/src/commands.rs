use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tidyplex_core::{OrganizeMode, PruneAction};

#[derive(Debug, Parser)]
#[command(name = "tidyplex")]
#[command(
    about = "Media server chores: fold loose videos into folders, prune leftovers, probe trackers",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move qualifying top-level videos into per-title folders
    Organize(OrganizeArgs),
    /// Recycle or delete top-level folders below the size threshold
    Prune(PruneArgs),
    /// Probe tracker lists and rewrite the output file with live, fast trackers
    Trackers(TrackerArgs),
    /// Print configuration values
    PrintConfig,
}

/// Flags override Config.toml and environment values for this run.
#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Directory holding the loose video files
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// "downloads" (episodic and size filters) or "library" (folder everything)
    #[arg(long)]
    pub mode: Option<OrganizeMode>,

    /// Minimum video size in MB for downloads mode
    #[arg(long)]
    pub min_size_mb: Option<u64>,
}

#[derive(Debug, Args)]
pub struct PruneArgs {
    /// Directory whose immediate subdirectories are candidates
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Folders below this many KB are pruned
    #[arg(long)]
    pub threshold_kb: Option<u64>,

    /// "recycle" (move to the recycle dir) or "delete" (permanent)
    #[arg(long)]
    pub action: Option<PruneAction>,

    /// Destination for recycled folders
    #[arg(long)]
    pub recycle_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TrackerArgs {
    /// File rewritten with the surviving trackers
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Per-probe timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Drop trackers slower than this many milliseconds
    #[arg(long)]
    pub ceiling_ms: Option<u64>,

    /// Concurrent probe workers
    #[arg(long)]
    pub concurrency: Option<usize>,
}
