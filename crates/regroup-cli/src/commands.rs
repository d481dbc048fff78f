use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "regroup")]
#[command(about = "Find folders that hold the same thing under different names and merge them", long_about = None)]
pub struct Cli {
    /// Log at debug level unless TRACING_LEVEL says otherwise
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(short = 'l', long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a base directory and list groups of matching folders
    Scan(ScanArgs),
    /// Review each group of matching folders and merge the chosen ones
    Merge(MergeArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory whose immediate subfolders are compared
    pub base_path: PathBuf,

    /// Minimum confidence (0-100) for two folders to be grouped
    #[arg(short = 'c', long, value_parser = parse_confidence)]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Directory whose immediate subfolders are compared
    pub base_path: PathBuf,

    /// Minimum confidence (0-100) for two folders to be grouped
    #[arg(short = 'c', long, value_parser = parse_confidence)]
    pub min_confidence: Option<f64>,

    /// Report every decision without changing any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

fn parse_confidence(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    regroup_core::config::validate_confidence(parsed).map_err(|e| e.to_string())
}
