use colored::*;
use regroup_core::{
    Error, MatchGroup, MergeChoice, MergePreview, MergeSelection, ReviewAction, SelectionHandler,
};
use std::io::{self, BufRead, Write};

use crate::render::{format_size, write_group, write_preview};

/// Reads operator decisions from a line-based input.
///
/// End of input counts as quit so a closed stdin never loops.
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
    dry_run: bool,
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(input: R, output: W, dry_run: bool) -> Self {
        Self {
            input,
            output,
            dry_run,
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, message: impl std::fmt::Display) {
        let _ = writeln!(self.output, "{}", message);
    }

    fn choose(&mut self, group: &MatchGroup, index: usize, total: usize) -> io::Result<ReviewAction> {
        write_group(&mut self.output, group, index, total)?;

        loop {
            let Some(answer) = self.ask("[m]erge, [s]kip or [q]uit? ")? else {
                return Ok(ReviewAction::Quit);
            };
            match answer.to_lowercase().as_str() {
                "m" | "merge" => break,
                "s" | "skip" => return Ok(ReviewAction::Skip),
                "q" | "quit" => return Ok(ReviewAction::Quit),
                _ => self.say("Please answer m, s or q.".yellow()),
            }
        }

        let count = group.folders.len();
        let chosen = loop {
            let prompt = format!("Folders to merge (e.g. \"1 3 4\" or \"all\", 1-{}): ", count);
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(ReviewAction::Quit);
            };
            match parse_folder_selection(&answer, count) {
                Ok(chosen) => break chosen,
                Err(msg) => self.say(msg.red()),
            }
        };

        for (i, &idx) in chosen.iter().enumerate() {
            let line = format!("  {}. {}", i + 1, group.folders[idx].name);
            self.say(line);
        }
        let primary = loop {
            let prompt = format!("Primary folder (1-{}) [1]: ", chosen.len());
            let Some(answer) = self.ask(&prompt)? else {
                return Ok(ReviewAction::Quit);
            };
            match parse_primary(&answer, &chosen) {
                Ok(primary) => break primary,
                Err(msg) => self.say(msg.red()),
            }
        };

        let merge_from = chosen.into_iter().filter(|&idx| idx != primary).collect();
        Ok(ReviewAction::Merge(MergeChoice::new(primary, merge_from)))
    }
}

impl<R: BufRead, W: Write> SelectionHandler for TerminalSelector<R, W> {
    fn review(&mut self, group: &MatchGroup, index: usize, total: usize) -> ReviewAction {
        self.choose(group, index, total).unwrap_or(ReviewAction::Quit)
    }

    fn confirm(&mut self, selection: &MergeSelection, preview: &MergePreview) -> bool {
        let sources: Vec<&str> = selection.merge_from().iter().map(|f| f.name.as_str()).collect();
        let header = format!(
            "Merge {} ({} files, {}) into {}{}:",
            sources.join(", "),
            selection.source_file_count(),
            format_size(selection.source_size_bytes()),
            selection.primary().name.cyan(),
            if self.dry_run { " (dry run)" } else { "" }
        );
        self.say(header);
        if write_preview(&mut self.output, preview).is_err() {
            return false;
        }
        if !preview.has_work() {
            self.say("Nothing to copy, resolve or remove.".dimmed());
        }
        prompt_confirm(&mut self.input, &mut self.output, "Proceed with merge?", Some(false))
            .unwrap_or(false)
    }

    fn rejected(&mut self, error: &Error) {
        self.say(format!("Invalid selection: {}", error).red());
    }
}

/// Parse `"all"` or a list of 1-based folder numbers separated by spaces or
/// commas into distinct 0-based indices. At least two folders are required.
pub fn parse_folder_selection(input: &str, count: usize) -> Result<Vec<usize>, String> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return if count >= 2 {
            Ok((0..count).collect())
        } else {
            Err("A merge needs at least two folders.".to_string())
        };
    }

    let mut chosen = Vec::new();
    for token in trimmed.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        let number: usize = token
            .parse()
            .map_err(|_| format!("'{}' is not a folder number.", token))?;
        if number == 0 || number > count {
            return Err(format!("{} is out of range (1-{}).", number, count));
        }
        if chosen.contains(&(number - 1)) {
            return Err(format!("{} was given more than once.", number));
        }
        chosen.push(number - 1);
    }

    if chosen.len() < 2 {
        return Err("Select at least two folders.".to_string());
    }
    Ok(chosen)
}

/// Parse the primary's position within `chosen`; empty input picks the first.
pub fn parse_primary(input: &str, chosen: &[usize]) -> Result<usize, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return chosen
            .first()
            .copied()
            .ok_or_else(|| "No folders selected.".to_string());
    }
    let number: usize = trimmed
        .parse()
        .map_err(|_| format!("'{}' is not a number.", trimmed))?;
    if number == 0 || number > chosen.len() {
        return Err(format!("{} is out of range (1-{}).", number, chosen.len()));
    }
    Ok(chosen[number - 1])
}

pub fn prompt_confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: Option<bool>,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(true) => write!(output, "{} (Y/n): ", prompt)?,
            Some(false) | None => write!(output, "{} (y/N): ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match line.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
