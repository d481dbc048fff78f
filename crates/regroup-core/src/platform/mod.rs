#[cfg(target_os = "windows")]
pub mod windows;

use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::io;
use std::time::SystemTime;

#[cfg(target_os = "windows")]
pub fn is_disk_full(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::StorageFull || windows::is_disk_full_code(err.raw_os_error())
}

#[cfg(not(target_os = "windows"))]
pub fn is_disk_full(err: &io::Error) -> bool {
    // ENOSPC
    err.kind() == io::ErrorKind::StorageFull || err.raw_os_error() == Some(28)
}

/// Creation time of a file, falling back to modification time on filesystems
/// that do not record birth time.
pub fn created_time(metadata: &Metadata) -> io::Result<SystemTime> {
    metadata.created().or_else(|_| metadata.modified())
}

pub fn to_local(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}
