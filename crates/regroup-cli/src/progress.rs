use indicatif::{ProgressBar, ProgressStyle};
use regroup_core::{MergeOperationResult, ProgressReporter};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (folder count unknown upfront)
/// - Merge phase: progress bar sized by the sources' file counts
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.lock();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.lock().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICKS),
        );
        pb.set_message("Scanning folders...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_progress(&self, folders_scanned: usize, current_folder: &str) {
        if let Some(pb) = self.lock().as_ref() {
            pb.set_message(format!(
                "Scanning... {} folders ({})",
                folders_scanned, current_folder
            ));
        }
    }

    fn on_scan_complete(&self, total_folders: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} folders in {:.2}s",
            total_folders, duration_secs
        );
    }

    fn on_match_complete(&self, groups: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Matching complete: {} groups in {:.2}s",
            groups, duration_secs
        );
    }

    fn on_merge_start(&self, primary_name: &str, total_files: u64) {
        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICKS),
        );
        pb.set_message(format!("Merging into {}", primary_name));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_merge_progress(&self, files_processed: u64) {
        if let Some(pb) = self.lock().as_ref() {
            // Files added since the scan can push past the estimate.
            if pb.length().is_some_and(|len| files_processed > len) {
                pb.set_length(files_processed);
            }
            pb.set_position(files_processed);
        }
    }

    fn on_merge_complete(&self, result: &MergeOperationResult) {
        self.finish_bar();
        let mark = if result.is_aborted() {
            "\x1b[31m✗\x1b[0m"
        } else {
            "\x1b[32m✓\x1b[0m"
        };
        eprintln!(
            "  {} Merge {}: {} copied, {} duplicates, {} conflicts, {} folders removed",
            mark,
            if result.dry_run { "simulated" } else { "complete" },
            result.files_copied,
            result.files_skipped_duplicate,
            result.conflicts_resolved,
            result.folders_removed,
        );
    }
}
