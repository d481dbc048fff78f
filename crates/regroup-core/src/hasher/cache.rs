use ahash::AHashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

use super::sha256::{self, ContentDigest};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    len: u64,
    modified: Option<SystemTime>,
    digest: ContentDigest,
}

/// In-process digest cache keyed by canonical path.
///
/// An entry is reused only while the file's size and modification time are
/// unchanged. The cache lives for one run and is passed explicitly to whatever
/// needs it.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: AHashMap<PathBuf, CacheEntry>,
    hits: usize,
    misses: usize,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest of `file`, computed at most once per unchanged file.
    pub fn digest(&mut self, file: &Path) -> io::Result<ContentDigest> {
        let canonical = fs::canonicalize(file)?;
        let metadata = fs::metadata(&canonical)?;
        let len = metadata.len();
        let modified = metadata.modified().ok();

        if let Some(entry) = self.entries.get(&canonical) {
            if entry.len == len && entry.modified == modified {
                trace!("Found hash for {} in cache", file.display());
                self.hits += 1;
                return Ok(entry.digest);
            }
        }

        let digest = sha256::hash_file(&canonical)?;
        trace!("No hash for {} in cache, adding", file.display());
        self.misses += 1;
        self.entries.insert(
            canonical,
            CacheEntry {
                len,
                modified,
                digest,
            },
        );
        Ok(digest)
    }

    /// Forget `file` after it has been rewritten in place.
    pub fn invalidate(&mut self, file: &Path) {
        if let Ok(canonical) = fs::canonicalize(file) {
            self.entries.remove(&canonical);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
