use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

/// How the organizer treats top-level video files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizeMode {
    /// Mixed download landing zone: skip episodic names, enforce the
    /// minimum size so samples and extras stay put.
    Downloads,
    /// Curated movie library: every top-level video gets a folder.
    Library,
}

impl FromStr for OrganizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "downloads" => Ok(OrganizeMode::Downloads),
            "library" => Ok(OrganizeMode::Library),
            other => Err(format!(
                "unknown organize mode {other:?} (expected \"downloads\" or \"library\")"
            )),
        }
    }
}

impl fmt::Display for OrganizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeMode::Downloads => write!(f, "downloads"),
            OrganizeMode::Library => write!(f, "library"),
        }
    }
}

/// What happens to a folder below the prune threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruneAction {
    /// Move it into the recycle directory. Reversible.
    Recycle,
    /// Remove it permanently.
    Delete,
}

impl FromStr for PruneAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recycle" => Ok(PruneAction::Recycle),
            "delete" => Ok(PruneAction::Delete),
            other => Err(format!(
                "unknown prune action {other:?} (expected \"recycle\" or \"delete\")"
            )),
        }
    }
}

impl fmt::Display for PruneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneAction::Recycle => write!(f, "recycle"),
            PruneAction::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Directory whose top-level files get foldered. No default; must be
    /// set in Config.toml, the environment or on the command line.
    pub source_dir: Option<PathBuf>,
    pub mode: OrganizeMode,
    /// Videos smaller than this stay put in downloads mode.
    pub min_movie_size_mb: u64,
    /// Extensions treated as video, compared case-insensitively.
    pub video_extensions: Vec<String>,
    /// Extra episodic-name regexes, tried alongside the built-ins.
    pub extra_episode_patterns: Vec<String>,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        OrganizeConfig {
            source_dir: None,
            mode: OrganizeMode::Downloads,
            min_movie_size_mb: 900,
            video_extensions: default_video_extensions(),
            extra_episode_patterns: Vec::new(),
        }
    }
}

fn default_video_extensions() -> Vec<String> {
    [
        "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "ts", "m2ts",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Directory whose immediate subdirectories are candidates.
    pub root_dir: Option<PathBuf>,
    /// Folders whose recursive size is below this survive only if they
    /// match an exclude pattern.
    pub threshold_kb: u64,
    pub action: PruneAction,
    /// Destination for recycled folders. Required when `action` is
    /// `recycle`; must live outside `root_dir`.
    pub recycle_dir: Option<PathBuf>,
    /// Glob patterns (matched against the folder name) that are never
    /// pruned, whatever their size.
    pub exclude_patterns: Vec<String>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        PruneConfig {
            root_dir: None,
            threshold_kb: 1024,
            action: PruneAction::Recycle,
            recycle_dir: None,
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "#recycle*",
        "@eaDir",
        "$RECYCLE.BIN",
        "System Volume Information",
        "lost+found",
        ".*",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// URLs of newline-separated tracker lists. Fetched in order; one
    /// reachable source is enough for the run to proceed.
    pub source_urls: Vec<String>,
    /// Announce URLs that are never probed and never written out.
    pub skip_trackers: Vec<String>,
    /// File rewritten with the surviving trackers, one per line.
    pub output_file: PathBuf,
    /// Per-attempt timeout for a single probe.
    pub probe_timeout_secs: u64,
    /// Extra attempts after a timed-out probe. Other failures are final.
    pub probe_retries: u32,
    /// Trackers slower than this are dropped even when they answer.
    pub latency_ceiling_ms: u64,
    /// Upper bound on concurrent probes.
    pub max_concurrency: usize,
    /// Whole-run deadline; probes still outstanding when it passes are
    /// abandoned and the results so far are written.
    pub run_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            source_urls: vec![
                "https://raw.githubusercontent.com/ngosang/trackerslist/master/trackers_all.txt"
                    .to_string(),
            ],
            skip_trackers: vec!["udp://tracker.theoks.net:6969/announce".to_string()],
            output_file: PathBuf::from("valid_trackers.txt"),
            probe_timeout_secs: 5,
            probe_retries: 1,
            latency_ceiling_ms: 500,
            max_concurrency: 16,
            run_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub organize: OrganizeConfig,
    pub prune: PruneConfig,
    pub trackers: TrackerConfig,
}

impl AppConfig {
    /// Layered load: built-in defaults, then an optional `Config.toml`
    /// in the working directory, then `TIDYPLEX__`-prefixed environment
    /// variables (`TIDYPLEX__PRUNE__THRESHOLD_KB=2048`).
    pub fn load() -> Result<AppConfig, ConfigError> {
        let builder = Config::builder()
            .add_source(ConfigFile::with_name("Config").required(false))
            .add_source(Environment::with_prefix("TIDYPLEX").separator("__"))
            .build()?;

        builder.try_deserialize::<AppConfig>()
    }
}
