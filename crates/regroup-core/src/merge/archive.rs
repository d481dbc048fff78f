use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::hasher::ContentDigest;
use crate::ARCHIVE_DIR_NAME;

/// `<stem>_<16 hex chars><.ext>` for a superseded file version.
///
/// `report.tar.gz` becomes `report.tar_<hash>.gz`; names without an extension
/// (including dotfiles such as `.bashrc`) get the hash appended.
pub fn archive_file_name(file_name: &Path, digest: &ContentDigest) -> OsString {
    let short = digest.short_hex();
    match (file_name.file_stem(), file_name.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => {
            let mut name = stem.to_os_string();
            name.push("_");
            name.push(&short);
            name.push(".");
            name.push(ext);
            name
        }
        _ => {
            let mut name = file_name
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            name.push("_");
            name.push(&short);
            name
        }
    }
}

/// Where the version of `relative_path` with `digest` is archived under `primary_root`:
/// a `.merged` directory beside the conflicting file.
pub fn archive_path(primary_root: &Path, relative_path: &Path, digest: &ContentDigest) -> PathBuf {
    let parent = relative_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = relative_path
        .file_name()
        .map(Path::new)
        .unwrap_or(relative_path);
    primary_root
        .join(parent)
        .join(ARCHIVE_DIR_NAME)
        .join(archive_file_name(file_name, digest))
}
