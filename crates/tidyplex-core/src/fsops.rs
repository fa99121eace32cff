use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

/// Move a file, falling back to copy-then-remove when rename fails
/// (typically a cross-device move onto another mount).
pub fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => match fs::copy(src, dest) {
            Ok(_) => fs::remove_file(src),
            Err(copy_err) => Err(io::Error::new(
                copy_err.kind(),
                format!("rename failed ({rename_err}); copy fallback failed ({copy_err})"),
            )),
        },
    }
}

/// Move a directory tree, falling back to recursive copy-then-remove
/// when rename fails.
pub fn move_dir(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => match copy_dir_recursive(src, dest) {
            Ok(()) => fs::remove_dir_all(src),
            Err(copy_err) => Err(io::Error::new(
                copy_err.kind(),
                format!("rename failed ({rename_err}); copy fallback failed ({copy_err})"),
            )),
        },
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dest.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            warn!("Skipping non-regular entry during copy: {:?}", entry.path());
        }
    }
    Ok(())
}

/// Recursive size of everything under `path` in bytes. Symlinks are
/// not followed and do not count. Unreadable entries are logged and
/// skipped rather than failing the walk.
pub fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    for entry in WalkDir::new(path) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    match entry.metadata() {
                        Ok(meta) => total += meta.len(),
                        Err(err) => warn!("Could not stat {:?}: {}", entry.path(), err),
                    }
                }
            }
            Err(err) => warn!("Error walking {:?}: {}", path, err),
        }
    }
    total
}

/// Human-readable size with one decimal above bytes.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
