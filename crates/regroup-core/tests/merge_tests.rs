use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use walkdir::WalkDir;

use regroup_core::hasher::hash_data;
use regroup_core::merge::archive_path;
use regroup_core::scanner::{scan_base, scan_folder};
use regroup_core::{
    HashCache, MatchGroup, MatchReason, Matcher, MergeExecutor, MergeSelection, SilentReporter,
};

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Long enough for creation and modification times to differ on any filesystem.
fn pause() {
    thread::sleep(Duration::from_millis(1100));
}

fn selection(primary: &Path, sources: &[&Path]) -> MergeSelection {
    let mut errors = Vec::new();
    let mut folders = vec![scan_folder(primary, &mut errors)];
    folders.extend(sources.iter().map(|s| scan_folder(s, &mut errors)));
    let group = MatchGroup {
        folders,
        confidence: 100.0,
        match_reason: MatchReason::ExactPrefix,
        base_name: "test".to_string(),
    };
    let merge_from: Vec<usize> = (1..=sources.len()).collect();
    MergeSelection::from_group(&group, 0, &merge_from).unwrap()
}

/// Every path under `root` with file contents, for before/after comparisons.
fn snapshot(root: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let contents = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (e.path().to_path_buf(), contents)
        })
        .collect()
}

#[test]
fn test_new_duplicate_and_nested_files() {
    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-old");
    write(&primary.join("same.txt"), "same");
    write(&source.join("same.txt"), "same");
    write(&source.join("only-here.txt"), "new");
    write(&source.join("docs/2020/report.md"), "deep");

    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(result.files_copied, 2);
    assert_eq!(result.files_skipped_duplicate, 1);
    assert_eq!(result.conflicts_resolved, 0);
    assert_eq!(result.files_errored, 0);
    assert!(result.errors.is_empty());
    assert_eq!(read(&primary.join("only-here.txt")), "new");
    assert_eq!(read(&primary.join("docs/2020/report.md")), "deep");
    // sources are copied, never consumed
    assert!(source.join("only-here.txt").exists());
}

#[test]
fn test_conflict_keeps_newer_primary_and_archives_source() {
    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-old");
    write(&source.join("notes/todo.txt"), "old version");
    pause();
    write(&primary.join("notes/todo.txt"), "new version");

    let mut cache = HashCache::new();
    let report = MergeExecutor::new(&mut cache, false)
        .run(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(report.result.conflicts_resolved, 1);
    assert_eq!(report.result.files_copied, 0);
    assert_eq!(read(&primary.join("notes/todo.txt")), "new version");

    let digest = hash_data(b"old version");
    let archived = primary
        .join("notes/.merged")
        .join(format!("todo_{}.txt", &digest.to_hex()[..16]));
    assert_eq!(archived, archive_path(&primary, Path::new("notes/todo.txt"), &digest));
    assert_eq!(read(&archived), "old version");

    let conflict = &report.conflicts[0];
    assert_eq!(conflict.relative_path, PathBuf::from("notes/todo.txt"));
    assert!(conflict.primary_is_newer());
    assert_eq!(conflict.source_hash, digest.to_hex());
}

#[test]
fn test_conflict_with_newer_source_replaces_primary() {
    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-backup");
    write(&primary.join("data.bin"), "stale");
    pause();
    write(&source.join("data.bin"), "fresh");

    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(result.conflicts_resolved, 1);
    assert_eq!(read(&primary.join("data.bin")), "fresh");
    let archived = archive_path(&primary, Path::new("data.bin"), &hash_data(b"stale"));
    assert_eq!(read(&archived), "stale");
    assert_eq!(read(&source.join("data.bin")), "fresh");
}

#[test]
fn test_backup_variants_merge_with_single_archive() {
    let tmp = tempdir().unwrap();
    let base = tmp.path();
    write(&base.join("computer-01/data.txt"), "X");
    write(&base.join("computer-01.old/data.txt"), "X");
    pause();
    write(&base.join("computer-01-backup/data.txt"), "Y");
    write(&base.join("unrelated-folder/readme.txt"), "R");

    let outcome = scan_base(base, &SilentReporter).unwrap();
    let groups = Matcher::new(70.0).find_groups(&outcome.folders);
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.confidence, 100.0);

    // computer-01, computer-01-backup, computer-01.old
    let selection = MergeSelection::from_group(group, 1, &[0, 2]).unwrap();
    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false).execute(&selection, &SilentReporter);

    assert_eq!(result.conflicts_resolved, 1);
    assert_eq!(result.files_skipped_duplicate, 1);
    assert_eq!(result.files_copied, 0);
    assert!(result.errors.is_empty());

    let primary = base.join("computer-01-backup");
    assert_eq!(read(&primary.join("data.txt")), "Y");
    let archived: Vec<_> = fs::read_dir(primary.join(".merged")).unwrap().collect();
    assert_eq!(archived.len(), 1);
    let archived = archive_path(&primary, Path::new("data.txt"), &hash_data(b"X"));
    assert_eq!(read(&archived), "X");
}

#[test]
fn test_delimiter_variants_merge_with_one_conflict() {
    let tmp = tempdir().unwrap();
    let base = tmp.path();
    write(&base.join("192.168.1.5-computer02/system.log"), "first boot");
    pause();
    write(&base.join("192.168.1.5 computer02/system.log"), "second boot");

    let outcome = scan_base(base, &SilentReporter).unwrap();
    let groups = Matcher::new(70.0).find_groups(&outcome.folders);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].confidence, 90.0);

    let selection = MergeSelection::from_group(&groups[0], 0, &[1]).unwrap();
    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false).execute(&selection, &SilentReporter);

    assert_eq!(result.conflicts_resolved, 1);
    assert_eq!(result.files_copied, 0);
}

fn mixed_tree(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let primary = root.join("pc");
    let old = root.join("pc-old");
    let backup = root.join("pc-backup");

    write(&old.join("older-in-source.txt"), "source v1");
    write(&primary.join("newer-in-source.txt"), "primary v1");
    write(&primary.join("same.txt"), "same");
    write(&primary.join("blocked"), "a file where a folder would go");
    write(&backup.join("fresh/a.txt"), "a-other");
    pause();
    write(&primary.join("older-in-source.txt"), "primary v2");
    write(&backup.join("newer-in-source.txt"), "backup v2");

    write(&old.join("same.txt"), "same");
    write(&old.join("fresh/a.txt"), "a");
    write(&backup.join("blocked/inner.txt"), "cannot land");
    write(&old.join(".merged/ignored_0000000000000000.txt"), "archived");
    fs::create_dir_all(old.join("empty/deeper")).unwrap();
    fs::create_dir_all(backup.join("hollow")).unwrap();

    (primary, old, backup)
}

#[test]
fn test_dry_run_counts_match_live_run() {
    let tmp = tempdir().unwrap();
    let (primary, old, backup) = mixed_tree(tmp.path());
    let selection = selection(&primary, &[&old, &backup]);

    let before = snapshot(tmp.path());
    let mut cache = HashCache::new();
    let dry = MergeExecutor::new(&mut cache, true).execute(&selection, &SilentReporter);
    assert_eq!(snapshot(tmp.path()), before);
    assert!(dry.dry_run);

    let live = MergeExecutor::new(&mut cache, false).execute(&selection, &SilentReporter);
    assert!(!live.dry_run);
    assert!(dry.same_counts(&live), "dry {:?}\nlive {:?}", dry, live);

    // fresh/a.txt copied from pc-old, then conflicts with pc-backup's copy
    assert_eq!(live.files_copied, 1);
    assert_eq!(live.files_skipped_duplicate, 1);
    assert_eq!(live.conflicts_resolved, 3);
    assert_eq!(live.files_errored, 1);
    assert_eq!(live.folders_removed, 3);
    assert_eq!(live.errors.len(), 1);
    assert!(live.errors[0].contains("blocked"));
}

#[test]
fn test_second_run_finds_nothing_new() {
    let tmp = tempdir().unwrap();
    let (primary, old, backup) = mixed_tree(tmp.path());
    fs::remove_file(primary.join("blocked")).unwrap();

    let mut cache = HashCache::new();
    let first = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&old, &backup]), &SilentReporter);
    assert!(first.conflicts_resolved > 0);

    let second = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&old, &backup]), &SilentReporter);
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.conflicts_resolved, 0);
    assert_eq!(second.files_errored, 0);
    assert_eq!(second.folders_removed, 0);
}

#[test]
fn test_merged_dirs_are_never_walked_or_removed() {
    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-old");
    fs::create_dir_all(&primary).unwrap();
    write(&source.join("sub/.merged/old_0123456789abcdef.txt"), "kept");
    fs::create_dir_all(source.join(".merged")).unwrap();

    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(result.files_copied, 0);
    assert_eq!(result.folders_removed, 0);
    assert!(source.join("sub/.merged/old_0123456789abcdef.txt").exists());
    assert!(source.join(".merged").is_dir());
    assert!(!primary.join("sub").exists());
}

#[test]
fn test_emptied_source_tree_is_removed() {
    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-old");
    fs::create_dir_all(&primary).unwrap();
    fs::create_dir_all(source.join("a/b")).unwrap();

    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, false)
        .execute(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(result.folders_removed, 3);
    assert!(!source.exists());
}

#[cfg(unix)]
#[test]
fn test_dangling_link_counts_as_errored_file() {
    use regroup_core::MergePreview;
    use std::os::unix::fs::symlink;

    for dry_run in [true, false] {
        let tmp = tempdir().unwrap();
        let primary = tmp.path().join("pc");
        let source = tmp.path().join("pc-old");
        fs::create_dir_all(&primary).unwrap();
        write(&source.join("ok.txt"), "ok");
        symlink(tmp.path().join("missing.txt"), source.join("dangling.txt")).unwrap();

        let mut cache = HashCache::new();
        let report = MergeExecutor::new(&mut cache, dry_run)
            .run(&selection(&primary, &[&source]), &SilentReporter);

        assert_eq!(report.result.files_copied, 1, "dry_run={}", dry_run);
        assert_eq!(report.result.files_errored, 1, "dry_run={}", dry_run);
        assert_eq!(report.result.errors.len(), 1);
        assert!(report.result.errors[0].contains("dangling.txt"));
        assert!(!report.result.is_aborted());
        assert_eq!(MergePreview::from_report(&report).would_error, 1);
        assert_eq!(primary.join("ok.txt").exists(), !dry_run);
    }
}

#[cfg(unix)]
#[test]
fn test_link_loop_is_not_an_errored_file() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    let primary = tmp.path().join("pc");
    let source = tmp.path().join("pc-old");
    fs::create_dir_all(&primary).unwrap();
    write(&source.join("ok.txt"), "ok");
    // a link back to an ancestor is a walk error on a directory
    symlink(&source, source.join("loop")).unwrap();

    let mut cache = HashCache::new();
    let result = MergeExecutor::new(&mut cache, true)
        .execute(&selection(&primary, &[&source]), &SilentReporter);

    assert_eq!(result.files_copied, 1);
    assert_eq!(result.files_errored, 0);
    assert_eq!(result.errors.len(), 1);
}
