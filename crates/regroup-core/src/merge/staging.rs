use ahash::AHashMap;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::hasher::ContentDigest;

/// A file this run has written (or, in a dry run, would have written).
#[derive(Debug, Clone, Copy)]
pub(crate) struct StagedFile {
    pub digest: ContentDigest,
    pub created: DateTime<Local>,
}

/// Overlay of every path the executor has placed content at during one run.
///
/// Lookups consult the overlay before the disk, so a dry run sees its own
/// planned copies exactly as a live run sees its real ones.
#[derive(Debug, Default)]
pub(crate) struct StagedTree {
    files: AHashMap<PathBuf, StagedFile>,
}

impl StagedTree {
    pub fn get(&self, path: &Path) -> Option<&StagedFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn record(&mut self, path: PathBuf, digest: ContentDigest) {
        self.files.insert(
            path,
            StagedFile {
                digest,
                created: Local::now(),
            },
        );
    }
}
