use colored::*;
use regroup_core::{FolderRecord, MatchGroup, MergePreview, RunSummary};
use std::io::{self, Write};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn date_range(folder: &FolderRecord) -> String {
    match (folder.oldest_file_time, folder.newest_file_time) {
        (Some(oldest), Some(newest)) => format!(
            "{} .. {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        ),
        _ => "empty".to_string(),
    }
}

pub fn write_group<W: Write>(
    out: &mut W,
    group: &MatchGroup,
    index: usize,
    total: usize,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} {} ({} confidence, {})",
        format!("Group {}/{}:", index + 1, total).bold(),
        group.base_name.cyan(),
        format!("{:.1}%", group.confidence).green(),
        group.match_reason.label()
    )?;
    for (i, folder) in group.folders.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<40} {:>7} files {:>10}  {}",
            i + 1,
            folder.name,
            folder.file_count,
            format_size(folder.total_size_bytes),
            date_range(folder).dimmed()
        )?;
    }
    Ok(())
}

pub fn write_preview<W: Write>(out: &mut W, preview: &MergePreview) -> io::Result<()> {
    writeln!(out, "  Files to copy:         {}", preview.would_copy.to_string().green())?;
    writeln!(out, "  Duplicates to skip:    {}", preview.would_skip)?;
    writeln!(out, "  Conflicts to resolve:  {}", preview.would_conflict.to_string().yellow())?;
    writeln!(out, "  Empty folders removed: {}", preview.would_remove)?;
    if preview.would_error > 0 {
        writeln!(out, "  Files with errors:     {}", preview.would_error.to_string().red())?;
    }
    for path in &preview.conflicting_paths {
        writeln!(out, "    {} {}", "conflict:".yellow(), path.display())?;
    }
    Ok(())
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Summary".bold());
    println!("  Folders scanned:     {}", summary.folders_scanned);
    println!("  Groups found:        {}", summary.groups_found);
    println!("  Merges executed:     {}", summary.total_operations);
    println!("  Files copied:        {}", summary.files_copied.to_string().green());
    println!("  Duplicates skipped:  {}", summary.files_skipped_duplicate);
    println!("  Conflicts resolved:  {}", summary.conflicts_resolved.to_string().yellow());
    println!("  Folders removed:     {}", summary.folders_removed);
    println!("  Duration:            {:.2}s", summary.duration.as_secs_f64());
    if !summary.scan_errors.is_empty() {
        println!("  Scan errors:         {}", summary.scan_errors.len().to_string().red());
    }
    if !summary.errors.is_empty() {
        println!("  {}", format!("Errors ({}):", summary.errors.len()).red());
        for err in &summary.errors {
            println!("    {}", err);
        }
    }
    if summary.interrupted {
        println!("  {}", "Stopped before all groups were reviewed".yellow());
    }
}
