use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;
use crate::model::FolderRecord;
use crate::platform;
use crate::progress::ProgressReporter;
use crate::ARCHIVE_DIR_NAME;

/// Folders found under a base path plus the non-fatal errors hit on the way.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub folders: Vec<FolderRecord>,
    pub errors: Vec<String>,
}

/// Enumerate the immediate subdirectories of `base` and aggregate metadata for
/// each one's full subtree. Results are sorted by folder name.
///
/// Fails only when `base` is missing, is not a directory, or cannot be listed.
pub fn scan_base(base: &Path, reporter: &dyn ProgressReporter) -> Result<ScanOutcome, Error> {
    let metadata = match fs::metadata(base) {
        Ok(m) => m,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::BasePathMissing(base.to_path_buf()))
        }
        Err(err) => return Err(Error::Io(err)),
    };
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(base.to_path_buf()));
    }

    let entries = fs::read_dir(base).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Error reading directory {}: {}", base.display(), err),
        )
    })?;

    let mut outcome = ScanOutcome::default();
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let msg = format!("Error reading entry in {}: {}", base.display(), err);
                warn!("{}", msg);
                outcome.errors.push(msg);
                continue;
            }
        };

        let path = entry.path();
        // is_dir follows symlinks
        if !path.is_dir() || entry.file_name() == ARCHIVE_DIR_NAME {
            continue;
        }

        let folder = scan_folder(&path, &mut outcome.errors);
        reporter.on_scan_progress(outcome.folders.len() + 1, &folder.name);
        outcome.folders.push(folder);
    }

    outcome.folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(outcome)
}

/// Walk one folder recursively, following symlinks and skipping `.merged`
/// directories at every depth. Unreadable entries are recorded in `errors`.
pub fn scan_folder(folder: &Path, errors: &mut Vec<String>) -> FolderRecord {
    let mut file_count = 0u64;
    let mut total_size = 0u64;
    let mut oldest = None;
    let mut newest = None;

    let walker = WalkDir::new(folder)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_archive_dir(entry));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let msg = format!("Error walking {}: {}", folder.display(), err);
                warn!("{}", msg);
                errors.push(msg);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                let msg = format!("Error accessing file {}: {}", entry.path().display(), err);
                warn!("{}", msg);
                errors.push(msg);
                continue;
            }
        };

        file_count += 1;
        total_size += metadata.len();

        if let Ok(created) = platform::created_time(&metadata) {
            if oldest.map_or(true, |t| created < t) {
                oldest = Some(created);
            }
            if newest.map_or(true, |t| created > t) {
                newest = Some(created);
            }
        }
    }

    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.to_string_lossy().into_owned());

    debug!(
        "Scanned {}: {} files, {} bytes",
        folder.display(),
        file_count,
        total_size
    );

    FolderRecord {
        path: folder.to_path_buf(),
        name,
        file_count,
        total_size_bytes: total_size,
        oldest_file_time: oldest.map(platform::to_local),
        newest_file_time: newest.map(platform::to_local),
    }
}

pub(crate) fn is_archive_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ARCHIVE_DIR_NAME
}
