pub mod groups;
pub mod tiers;

use std::time::Instant;
use tracing::info;

use crate::config::DEFAULT_MIN_CONFIDENCE;
use crate::model::{FolderRecord, MatchGroup};

pub use groups::group_folders_with;
pub use tiers::{normalize_name, score_pair, tokenize, PairScore};

/// Groups folders whose names look like variants of one another.
#[derive(Debug, Clone)]
pub struct Matcher {
    min_confidence: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl Matcher {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Score a single pair with the tier cascade.
    pub fn score(&self, a: &FolderRecord, b: &FolderRecord) -> Option<PairScore> {
        score_pair(&a.name, &b.name)
    }

    /// Cluster folders into match groups, strongest first.
    pub fn find_groups(&self, folders: &[FolderRecord]) -> Vec<MatchGroup> {
        let start = Instant::now();
        let groups = group_folders_with(folders, self.min_confidence, score_pair);
        info!(
            "Matched {} folders into {} groups in {:.2}s",
            folders.len(),
            groups.len(),
            start.elapsed().as_secs_f64()
        );
        groups
    }
}
