use crate::model::MergeOperationResult;

/// Trait for reporting scan and merge progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _folders_scanned: usize, _current_folder: &str) {}
    fn on_scan_complete(&self, _total_folders: usize, _duration_secs: f64) {}
    fn on_match_complete(&self, _groups: usize, _duration_secs: f64) {}
    fn on_merge_start(&self, _primary_name: &str, _total_files: u64) {}
    fn on_merge_progress(&self, _files_processed: u64) {}
    fn on_merge_complete(&self, _result: &MergeOperationResult) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
