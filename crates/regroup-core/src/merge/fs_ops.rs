use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::warn;

use crate::hasher::{ContentDigest, HashCache};

/// Filesystem reads and writes the executor performs on file contents.
///
/// Every method has a default that goes to disk. Tests override single
/// methods to fail the way a real disk does.
pub(crate) trait FileOps {
    fn digest(&self, cache: &mut HashCache, path: &Path) -> io::Result<ContentDigest> {
        cache.digest(path)
    }

    fn copy(&self, source: &Path, dest: &Path) -> io::Result<()> {
        copy_file(source, dest)
    }

    fn rename(&self, source: &Path, dest: &Path) -> io::Result<()> {
        move_file(source, dest)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// [`FileOps`] straight against the filesystem.
pub(crate) struct DiskOps;

impl FileOps for DiskOps {}

/// Copy `source` to `dest`, creating parent directories and keeping the
/// source's modification time.
pub fn copy_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;

    let modified = fs::metadata(source).and_then(|m| m.modified());
    let applied = modified.and_then(|time| {
        File::options()
            .write(true)
            .open(dest)
            .and_then(|f| f.set_modified(time))
    });
    if let Err(e) = applied {
        warn!("Could not preserve modification time on {}: {}", dest.display(), e);
    }
    Ok(())
}

/// Move `source` to `dest` within one tree, creating parent directories.
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(source, dest)
}
