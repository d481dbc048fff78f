use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// Metadata for one candidate folder directly under the scanned base path.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderRecord {
    pub path: PathBuf,
    pub name: String,
    pub file_count: u64,
    pub total_size_bytes: u64,
    /// Earliest file creation time seen in the subtree (`None` for an empty folder).
    pub oldest_file_time: Option<DateTime<Local>>,
    pub newest_file_time: Option<DateTime<Local>>,
}

/// Which tier of the name matcher produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchReason {
    ExactPrefix,
    Normalized,
    Token,
    Fuzzy,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::ExactPrefix => "exact_prefix",
            MatchReason::Normalized => "normalized",
            MatchReason::Token => "token",
            MatchReason::Fuzzy => "fuzzy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchReason::ExactPrefix => "Exact Prefix",
            MatchReason::Normalized => "Normalized",
            MatchReason::Token => "Token Match",
            MatchReason::Fuzzy => "Fuzzy Match",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connected set of folders the matcher believes are the same entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchGroup {
    pub folders: Vec<FolderRecord>,
    pub confidence: f64,
    pub match_reason: MatchReason,
    pub base_name: String,
}

/// An operator-approved merge: `merge_from` folders flow into `primary`.
///
/// Only constructible through [`MergeSelection::from_group`], which enforces
/// that both sides come from the same group and that the primary is not also
/// a source.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSelection {
    primary: FolderRecord,
    merge_from: Vec<FolderRecord>,
    group_confidence: f64,
    group_base_name: String,
}

impl MergeSelection {
    /// Build a selection from indices into `group.folders`.
    pub fn from_group(
        group: &MatchGroup,
        primary: usize,
        merge_from: &[usize],
    ) -> Result<MergeSelection, Error> {
        let len = group.folders.len();
        if primary >= len {
            return Err(Error::InvalidSelection(format!(
                "primary index {} is out of range (group has {} folders)",
                primary + 1,
                len
            )));
        }
        if merge_from.is_empty() {
            return Err(Error::InvalidSelection(
                "at least one folder to merge from is required".to_string(),
            ));
        }

        let mut seen = vec![false; len];
        let mut sources = Vec::with_capacity(merge_from.len());
        for &idx in merge_from {
            if idx >= len {
                return Err(Error::InvalidSelection(format!(
                    "folder index {} is out of range (group has {} folders)",
                    idx + 1,
                    len
                )));
            }
            if idx == primary {
                return Err(Error::InvalidSelection(format!(
                    "'{}' cannot be both primary and a merge source",
                    group.folders[idx].name
                )));
            }
            if seen[idx] {
                return Err(Error::InvalidSelection(format!(
                    "folder index {} selected more than once",
                    idx + 1
                )));
            }
            seen[idx] = true;
            sources.push(group.folders[idx].clone());
        }

        Ok(MergeSelection {
            primary: group.folders[primary].clone(),
            merge_from: sources,
            group_confidence: group.confidence,
            group_base_name: group.base_name.clone(),
        })
    }

    pub fn primary(&self) -> &FolderRecord {
        &self.primary
    }

    pub fn merge_from(&self) -> &[FolderRecord] {
        &self.merge_from
    }

    pub fn group_confidence(&self) -> f64 {
        self.group_confidence
    }

    pub fn group_base_name(&self) -> &str {
        &self.group_base_name
    }

    pub fn source_file_count(&self) -> u64 {
        self.merge_from.iter().map(|f| f.file_count).sum()
    }

    pub fn source_size_bytes(&self) -> u64 {
        self.merge_from.iter().map(|f| f.total_size_bytes).sum()
    }
}

/// Two files at the same relative path whose contents differ.
#[derive(Debug, Clone, PartialEq)]
pub struct FileConflict {
    pub relative_path: PathBuf,
    pub primary_file: PathBuf,
    pub source_file: PathBuf,
    pub primary_hash: String,
    pub source_hash: String,
    pub primary_created: DateTime<Local>,
    pub source_created: DateTime<Local>,
}

impl FileConflict {
    /// Ties go to the primary side so an equal-age conflict never rewrites the primary.
    pub fn primary_is_newer(&self) -> bool {
        self.primary_created >= self.source_created
    }
}

/// Counters and errors for one executed (or simulated) [`MergeSelection`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOperationResult {
    pub primary: PathBuf,
    pub dry_run: bool,
    pub files_copied: usize,
    pub files_skipped_duplicate: usize,
    pub conflicts_resolved: usize,
    pub folders_removed: usize,
    /// Files that could not be classified or whose operation failed.
    pub files_errored: usize,
    pub errors: Vec<String>,
    /// Set when the selection was aborted (disk exhaustion).
    pub fatal_error: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl MergeOperationResult {
    pub fn new(primary: &Path, dry_run: bool) -> Self {
        let now = Local::now();
        Self {
            primary: primary.to_path_buf(),
            dry_run,
            files_copied: 0,
            files_skipped_duplicate: 0,
            conflicts_resolved: 0,
            folders_removed: 0,
            files_errored: 0,
            errors: Vec::new(),
            fatal_error: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.fatal_error.is_some()
    }

    /// True when both results made the same decisions, ignoring timing and mode.
    pub fn same_counts(&self, other: &MergeOperationResult) -> bool {
        self.files_copied == other.files_copied
            && self.files_skipped_duplicate == other.files_skipped_duplicate
            && self.conflicts_resolved == other.conflicts_resolved
            && self.folders_removed == other.folders_removed
            && self.files_errored == other.files_errored
    }
}

/// Aggregate of a whole orchestrated run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub folders_scanned: usize,
    pub groups_found: usize,
    pub scan_errors: Vec<String>,
    pub total_operations: usize,
    pub files_copied: usize,
    pub files_skipped_duplicate: usize,
    pub conflicts_resolved: usize,
    pub folders_removed: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn from_operations(operations: &[MergeOperationResult], duration: Duration) -> Self {
        Self {
            total_operations: operations.len(),
            files_copied: operations.iter().map(|op| op.files_copied).sum(),
            files_skipped_duplicate: operations
                .iter()
                .map(|op| op.files_skipped_duplicate)
                .sum(),
            conflicts_resolved: operations.iter().map(|op| op.conflicts_resolved).sum(),
            folders_removed: operations.iter().map(|op| op.folders_removed).sum(),
            errors: operations
                .iter()
                .flat_map(|op| op.errors.iter().cloned())
                .collect(),
            duration,
            ..Self::default()
        }
    }
}
