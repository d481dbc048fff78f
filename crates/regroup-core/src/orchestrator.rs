use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::Error;
use crate::hasher::HashCache;
use crate::matcher::Matcher;
use crate::merge::{MergeExecutor, MergePreview};
use crate::model::{FolderRecord, MatchGroup, MergeOperationResult, MergeSelection, RunSummary};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::scanner;
use crate::selection::{ReviewAction, SelectionHandler};

const JOURNAL: &str = "regroup::journal";

/// Where an orchestrated run currently is. Indices point into the group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    Reviewing(usize),
    Analyzing(usize),
    Executing(usize),
    Summarizing,
    Done,
}

/// Scanning and matching output, without any merge.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub folders: Vec<FolderRecord>,
    pub groups: Vec<MatchGroup>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Sequences scan, match, review, analysis and merge for one base path.
///
/// Owns the run's [`HashCache`], so the dry-run analysis and the merge that
/// follows it hash each file once.
pub struct Orchestrator {
    base: PathBuf,
    config: RunConfig,
    cache: HashCache,
    state: RunState,
    operations: Vec<MergeOperationResult>,
}

impl Orchestrator {
    pub fn new(base: impl Into<PathBuf>, config: RunConfig) -> Self {
        Self {
            base: base.into(),
            config,
            cache: HashCache::new(),
            state: RunState::Idle,
            operations: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    /// Results of every selection executed so far, in order.
    pub fn operations(&self) -> &[MergeOperationResult] {
        &self.operations
    }

    /// Scan and match only. Nothing is written.
    pub fn scan_only(&mut self, reporter: &dyn ProgressReporter) -> Result<ScanReport, Error> {
        let report = self.scan(reporter)?;
        self.state = RunState::Done;
        Ok(report)
    }

    /// Full interactive run. Per-file problems end up in the summary; only a
    /// failed precondition or an unreadable base path returns `Err`.
    pub fn run(
        &mut self,
        handler: &mut dyn SelectionHandler,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary, Error> {
        let start = Instant::now();
        if !self.config.dry_run {
            check_writable(&self.base)?;
        }

        let scan = self.scan(reporter)?;
        let total = scan.groups.len();
        let mut interrupted = false;

        'groups: for (index, group) in scan.groups.iter().enumerate() {
            self.state = RunState::Reviewing(index);
            let members: Vec<&str> = group.folders.iter().map(|f| f.name.as_str()).collect();
            info!(
                target: JOURNAL,
                group = index + 1,
                base_name = %group.base_name,
                confidence = group.confidence,
                reason = %group.match_reason,
                members = ?members,
                "match group"
            );

            let selection = loop {
                match handler.review(group, index, total) {
                    ReviewAction::Skip => {
                        info!("Skipped group {} ({})", index + 1, group.base_name);
                        continue 'groups;
                    }
                    ReviewAction::Quit => {
                        info!("Quit requested at group {} of {}", index + 1, total);
                        interrupted = true;
                        break 'groups;
                    }
                    ReviewAction::Merge(choice) => {
                        match MergeSelection::from_group(group, choice.primary, &choice.merge_from) {
                            Ok(selection) => break selection,
                            Err(e) => {
                                warn!("Rejected selection for group {}: {}", index + 1, e);
                                handler.rejected(&e);
                            }
                        }
                    }
                }
            };

            self.state = RunState::Analyzing(index);
            let preview = {
                let mut analyzer = MergeExecutor::new(&mut self.cache, true);
                MergePreview::from_report(&analyzer.run(&selection, &SilentReporter))
            };
            info!(
                target: JOURNAL,
                group = index + 1,
                primary = %selection.primary().path.display(),
                sources = selection.merge_from().len(),
                would_copy = preview.would_copy,
                would_skip = preview.would_skip,
                would_conflict = preview.would_conflict,
                would_remove = preview.would_remove,
                "planned merge"
            );

            if !handler.confirm(&selection, &preview) {
                info!("Merge of group {} cancelled by operator", index + 1);
                continue;
            }

            self.state = RunState::Executing(index);
            let report = MergeExecutor::new(&mut self.cache, self.config.dry_run).run(&selection, reporter);
            let result = report.result;
            info!(
                target: JOURNAL,
                group = index + 1,
                primary = %result.primary.display(),
                dry_run = result.dry_run,
                copied = result.files_copied,
                skipped = result.files_skipped_duplicate,
                conflicts = result.conflicts_resolved,
                removed = result.folders_removed,
                errors = result.errors.len(),
                aborted = result.is_aborted(),
                "merge result"
            );
            self.operations.push(result);
        }

        self.state = RunState::Summarizing;
        let mut summary = RunSummary::from_operations(&self.operations, start.elapsed());
        summary.folders_scanned = scan.folders.len();
        summary.groups_found = total;
        summary.scan_errors = scan.errors;
        summary.interrupted = interrupted;

        info!(
            target: JOURNAL,
            operations = summary.total_operations,
            copied = summary.files_copied,
            skipped = summary.files_skipped_duplicate,
            conflicts = summary.conflicts_resolved,
            removed = summary.folders_removed,
            duration_secs = summary.duration.as_secs_f64(),
            errors = summary.errors.len(),
            interrupted = summary.interrupted,
            "run summary"
        );
        debug!(
            "Hash cache: {} entries, {} hits, {} misses",
            self.cache.len(),
            self.cache.hits(),
            self.cache.misses()
        );

        self.state = RunState::Done;
        Ok(summary)
    }

    fn scan(&mut self, reporter: &dyn ProgressReporter) -> Result<ScanReport, Error> {
        self.state = RunState::Scanning;
        let start = Instant::now();

        info!("Scanning {}", self.base.display());
        reporter.on_scan_start();
        let outcome = scanner::scan_base(&self.base, reporter)?;
        reporter.on_scan_complete(outcome.folders.len(), start.elapsed().as_secs_f64());

        let match_start = Instant::now();
        let matcher = Matcher::new(self.config.min_confidence);
        let groups = matcher.find_groups(&outcome.folders);
        reporter.on_match_complete(groups.len(), match_start.elapsed().as_secs_f64());

        info!(
            target: JOURNAL,
            folders_scanned = outcome.folders.len(),
            groups_found = groups.len(),
            min_confidence = matcher.min_confidence(),
            scan_errors = outcome.errors.len(),
            "scan summary"
        );

        Ok(ScanReport {
            folders: outcome.folders,
            groups,
            errors: outcome.errors,
            duration: start.elapsed(),
        })
    }
}

fn check_writable(base: &Path) -> Result<(), Error> {
    match fs::metadata(base) {
        Ok(metadata) if metadata.is_dir() && metadata.permissions().readonly() => Err(Error::Other(
            format!("No write permission for {}", base.display()),
        )),
        // Missing or non-directory bases are reported by the scanner.
        _ => Ok(()),
    }
}
