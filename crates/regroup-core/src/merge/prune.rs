use std::fs;
use std::path::Path;
use tracing::debug;

use crate::ARCHIVE_DIR_NAME;

/// Remove `dir` and every directory beneath it that is empty, bottom-up.
///
/// A directory holding files, symlinks or a `.merged` child is kept, and so
/// is every ancestor of it. With `dry_run` nothing is removed but the count is
/// the same a live pass would produce. Returns whether `dir` is (or would be)
/// gone.
pub fn prune_empty_dirs(
    dir: &Path,
    dry_run: bool,
    removed: &mut usize,
    errors: &mut Vec<String>,
) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("Error reading directory {}: {}", dir.display(), e));
            return false;
        }
    };

    let mut empty = true;
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(_) => {
                empty = false;
                continue;
            }
        };
        let is_real_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_real_dir || entry.file_name() == ARCHIVE_DIR_NAME {
            empty = false;
            continue;
        }
        if !prune_empty_dirs(&entry.path(), dry_run, removed, errors) {
            empty = false;
        }
    }

    if !empty {
        return false;
    }
    if dry_run {
        debug!("[DRY RUN] Would remove empty directory: {}", dir.display());
        *removed += 1;
        return true;
    }
    match fs::remove_dir(dir) {
        Ok(()) => {
            debug!("Removed empty directory: {}", dir.display());
            *removed += 1;
            true
        }
        Err(e) => {
            debug!("Could not remove {}: {}", dir.display(), e);
            false
        }
    }
}
