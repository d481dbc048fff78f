pub mod archive;
pub mod executor;
mod fs_ops;
pub mod prune;
mod staging;

pub use archive::{archive_file_name, archive_path};
pub use executor::{MergeExecutor, MergeReport};

use std::path::PathBuf;

/// Would-be counts for a selection, shown to the operator before any write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePreview {
    pub would_copy: usize,
    pub would_skip: usize,
    pub would_conflict: usize,
    pub would_remove: usize,
    pub would_error: usize,
    pub conflicting_paths: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl MergePreview {
    pub fn from_report(report: &MergeReport) -> Self {
        Self {
            would_copy: report.result.files_copied,
            would_skip: report.result.files_skipped_duplicate,
            would_conflict: report.result.conflicts_resolved,
            would_remove: report.result.folders_removed,
            would_error: report.result.files_errored,
            conflicting_paths: report
                .conflicts
                .iter()
                .map(|c| c.relative_path.clone())
                .collect(),
            errors: report.result.errors.clone(),
        }
    }

    pub fn has_work(&self) -> bool {
        self.would_copy + self.would_conflict + self.would_remove > 0
    }
}
