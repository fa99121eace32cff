use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;

/// Rewrite the tracker file in one shot. Lines land in a temp file in
/// the target's directory which then replaces it by rename, so a
/// crashed run leaves the previous file untouched.
pub fn write_tracker_file(path: &Path, trackers: &[&str]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&dir)?;
    for tracker in trackers {
        writeln!(temp, "{tracker}")?;
    }
    temp.flush()?;
    temp.persist(path).map_err(|err| err.error)?;

    info!("Wrote {} tracker(s) to {}", trackers.len(), path.display());
    Ok(())
}
