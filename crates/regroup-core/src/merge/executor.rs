use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::archive::archive_path;
use super::fs_ops::{DiskOps, FileOps};
use super::prune::prune_empty_dirs;
use super::staging::StagedTree;
use crate::hasher::{ContentDigest, HashCache};
use crate::model::{FileConflict, MergeOperationResult, MergeSelection};
use crate::platform;
use crate::progress::ProgressReporter;
use crate::scanner::walk::is_archive_dir;

/// Result of one executor run plus every conflict it resolved.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub result: MergeOperationResult,
    pub conflicts: Vec<FileConflict>,
}

/// What one source file turned out to be.
enum FileOutcome {
    Copied,
    Duplicate,
    Conflict(Box<FileConflict>),
}

enum StepError {
    Failed(String),
    DiskFull(String),
}

impl StepError {
    fn from_io(context: String, err: io::Error) -> StepError {
        if platform::is_disk_full(&err) {
            StepError::DiskFull(format!("Disk full - aborting merge operation: {}: {}", context, err))
        } else if err.kind() == io::ErrorKind::PermissionDenied {
            StepError::Failed(format!("Permission denied: {} - {}", context, err))
        } else {
            StepError::Failed(format!("Error processing {}: {}", context, err))
        }
    }
}

/// What currently sits at a path under the primary, as this run sees it.
struct ExistingFile {
    digest: ContentDigest,
    created: chrono::DateTime<Local>,
}

/// Walks merge-from trees and folds them into the primary of a [`MergeSelection`].
///
/// Every decision goes through one code path for both modes; a dry run records
/// its planned writes in a staging overlay instead of on disk so that later
/// files in the same run see them.
pub struct MergeExecutor<'c> {
    cache: &'c mut HashCache,
    dry_run: bool,
    staged: StagedTree,
    ops: Box<dyn FileOps + 'c>,
}

impl<'c> MergeExecutor<'c> {
    pub fn new(cache: &'c mut HashCache, dry_run: bool) -> Self {
        Self {
            cache,
            dry_run,
            staged: StagedTree::default(),
            ops: Box::new(DiskOps),
        }
    }

    #[cfg(test)]
    fn with_ops(cache: &'c mut HashCache, dry_run: bool, ops: impl FileOps + 'c) -> Self {
        Self {
            ops: Box::new(ops),
            ..Self::new(cache, dry_run)
        }
    }

    /// Run the selection and return only the counters.
    pub fn execute(
        &mut self,
        selection: &MergeSelection,
        reporter: &dyn ProgressReporter,
    ) -> MergeOperationResult {
        self.run(selection, reporter).result
    }

    pub fn run(&mut self, selection: &MergeSelection, reporter: &dyn ProgressReporter) -> MergeReport {
        self.staged = StagedTree::default();
        let primary_root = selection.primary().path.clone();
        let mut result = MergeOperationResult::new(&primary_root, self.dry_run);
        let mut conflicts = Vec::new();
        let start = Instant::now();
        let mode = if self.dry_run { "[DRY RUN] " } else { "" };

        info!(
            "{}Merging {} folder(s) into {}",
            mode,
            selection.merge_from().len(),
            primary_root.display()
        );
        reporter.on_merge_start(&selection.primary().name, selection.source_file_count());

        let mut processed = 0u64;
        'sources: for source in selection.merge_from() {
            debug!("{}Processing source folder {}", mode, source.path.display());
            for entry_result in WalkDir::new(&source.path)
                .follow_links(true)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_archive_dir(e))
            {
                let entry = match entry_result {
                    Ok(entry) => entry,
                    Err(e) => {
                        // a dangling link or unreadable file; directory errors are not files
                        if e.depth() > 0 && e.path().is_some_and(|p| !p.is_dir()) {
                            result.files_errored += 1;
                        }
                        let message = format!("Error walking {}: {}", source.path.display(), e);
                        warn!("{}", message);
                        result.errors.push(message);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let relative = match entry.path().strip_prefix(&source.path) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => continue,
                };

                match self.merge_file(&primary_root, entry.path(), &relative) {
                    Ok(FileOutcome::Copied) => result.files_copied += 1,
                    Ok(FileOutcome::Duplicate) => result.files_skipped_duplicate += 1,
                    Ok(FileOutcome::Conflict(conflict)) => {
                        result.conflicts_resolved += 1;
                        conflicts.push(*conflict);
                    }
                    Err(StepError::Failed(message)) => {
                        warn!("{}", message);
                        result.files_errored += 1;
                        result.errors.push(message);
                    }
                    Err(StepError::DiskFull(message)) => {
                        error!("{}", message);
                        result.files_errored += 1;
                        result.errors.push(message.clone());
                        result.fatal_error = Some(message);
                        break 'sources;
                    }
                }

                processed += 1;
                reporter.on_merge_progress(processed);
            }

            let mut removed = 0;
            prune_empty_dirs(&source.path, self.dry_run, &mut removed, &mut result.errors);
            result.folders_removed += removed;
        }

        result.finished_at = Local::now();
        info!(
            "{}Merge into {} finished in {:.2}s: {} copied, {} duplicates, {} conflicts, {} folders removed, {} errors",
            mode,
            primary_root.display(),
            start.elapsed().as_secs_f64(),
            result.files_copied,
            result.files_skipped_duplicate,
            result.conflicts_resolved,
            result.folders_removed,
            result.errors.len(),
        );
        reporter.on_merge_complete(&result);

        MergeReport { result, conflicts }
    }

    fn merge_file(
        &mut self,
        primary_root: &Path,
        source_file: &Path,
        relative: &Path,
    ) -> Result<FileOutcome, StepError> {
        let dest = primary_root.join(relative);

        let source_digest = self
            .ops
            .digest(self.cache, source_file)
            .map_err(|e| StepError::Failed(format!("Hash failure: {} - {}", source_file.display(), e)))?;

        self.check_parent_dirs(primary_root, &dest)?;

        let existing = match self.existing_file(&dest)? {
            Some(existing) => existing,
            None => {
                if !self.dry_run {
                    self.ops
                        .copy(source_file, &dest)
                        .map_err(|e| StepError::from_io(source_file.display().to_string(), e))?;
                }
                debug!("New file: {}", relative.display());
                self.staged.record(dest, source_digest);
                return Ok(FileOutcome::Copied);
            }
        };

        if existing.digest == source_digest {
            debug!("Duplicate: {}", relative.display());
            return Ok(FileOutcome::Duplicate);
        }

        let source_created = fs::metadata(source_file)
            .and_then(|m| platform::created_time(&m))
            .map(platform::to_local)
            .map_err(|e| StepError::from_io(source_file.display().to_string(), e))?;

        let conflict = FileConflict {
            relative_path: relative.to_path_buf(),
            primary_file: dest.clone(),
            source_file: source_file.to_path_buf(),
            primary_hash: existing.digest.to_hex(),
            source_hash: source_digest.to_hex(),
            primary_created: existing.created,
            source_created,
        };

        if conflict.primary_is_newer() {
            let archive = archive_path(primary_root, relative, &source_digest);
            self.check_parent_dirs(primary_root, &archive)?;
            if self.archive_holds(&archive, &source_digest)? {
                debug!(
                    "Older version of {} already archived at {}",
                    relative.display(),
                    archive.display()
                );
                return Ok(FileOutcome::Duplicate);
            }
            if !self.dry_run {
                self.ops
                    .copy(source_file, &archive)
                    .map_err(|e| StepError::from_io(source_file.display().to_string(), e))?;
            }
            self.staged.record(archive.clone(), source_digest);
            info!(
                "Conflict on {}: kept primary, archived source as {}",
                relative.display(),
                archive.display()
            );
        } else {
            let archive = archive_path(primary_root, relative, &existing.digest);
            self.check_parent_dirs(primary_root, &archive)?;
            let already_archived = self.archive_holds(&archive, &existing.digest)?;
            if !self.dry_run {
                self.cache.invalidate(&dest);
                let displaced = if already_archived {
                    self.ops.remove(&dest)
                } else {
                    self.ops.rename(&dest, &archive)
                };
                displaced.map_err(|e| StepError::from_io(dest.display().to_string(), e))?;
                self.ops
                    .copy(source_file, &dest)
                    .map_err(|e| StepError::from_io(source_file.display().to_string(), e))?;
            }
            if !already_archived {
                self.staged.record(archive.clone(), existing.digest);
            }
            self.staged.record(dest, source_digest);
            info!(
                "Conflict on {}: source is newer, archived primary as {}",
                relative.display(),
                archive.display()
            );
        }

        Ok(FileOutcome::Conflict(Box::new(conflict)))
    }

    /// `Some` when a file is (or, in this run, will be) at `path`.
    fn existing_file(&mut self, path: &Path) -> Result<Option<ExistingFile>, StepError> {
        if let Some(staged) = self.staged.get(path) {
            return Ok(Some(ExistingFile {
                digest: staged.digest,
                created: staged.created,
            }));
        }

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StepError::from_io(path.display().to_string(), e)),
        };
        if metadata.is_dir() {
            return Err(StepError::Failed(format!(
                "Error processing {}: a directory exists at that path",
                path.display()
            )));
        }

        let digest = self
            .ops
            .digest(self.cache, path)
            .map_err(|e| StepError::Failed(format!("Hash failure: {} - {}", path.display(), e)))?;
        let created = platform::created_time(&metadata)
            .map(platform::to_local)
            .map_err(|e| StepError::from_io(path.display().to_string(), e))?;
        Ok(Some(ExistingFile { digest, created }))
    }

    /// Whether `archive` already holds `digest`. A different file there is an error.
    fn archive_holds(&mut self, archive: &Path, digest: &ContentDigest) -> Result<bool, StepError> {
        match self.existing_file(archive)? {
            None => Ok(false),
            Some(existing) if existing.digest == *digest => Ok(true),
            Some(_) => Err(StepError::Failed(format!(
                "Error processing {}: archive path holds different content",
                archive.display()
            ))),
        }
    }

    /// A file standing where `path` needs a directory would make the write fail;
    /// catch it up front so both modes report it the same way.
    fn check_parent_dirs(&self, primary_root: &Path, path: &Path) -> Result<(), StepError> {
        let relative = match path.strip_prefix(primary_root) {
            Ok(rel) => rel,
            Err(_) => return Ok(()),
        };
        let mut current = PathBuf::from(primary_root);
        let components: Vec<_> = relative.components().collect();
        for component in components.iter().take(components.len().saturating_sub(1)) {
            current.push(component);
            if self.staged.contains(&current) || current.is_file() {
                return Err(StepError::Failed(format!(
                    "Error processing {}: {} is a file, not a directory",
                    path.display(),
                    current.display()
                )));
            }
        }
        Ok(())
    }
}
