mod commands;
mod logging;
mod progress;
mod prompt;
mod render;

use std::io;
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, MergeArgs, ScanArgs};
use dotenv::dotenv;
use progress::CliReporter;
use prompt::TerminalSelector;
use regroup_core::{Orchestrator, RunConfig};
use tracing::{error, info, warn};

const EXIT_ERROR: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    dotenv().ok();

    let args = Cli::parse();
    let loaded = regroup_core::config::load_configuration();

    let log_file = args
        .log_file
        .clone()
        .or_else(|| loaded.as_ref().ok().and_then(|c| c.log_file.clone()));
    // Dropped when run() returns, before process::exit, so the log file is flushed.
    let _guard = logging::init_logger(log_file.as_deref(), args.verbose);

    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return EXIT_ERROR;
        }
    };

    let outcome = match args.command {
        Some(Commands::Scan(scan_args)) => run_scan(config, scan_args),
        Some(Commands::Merge(merge_args)) => run_merge(config, merge_args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(0)
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(0)
        }
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            EXIT_ERROR
        }
    }
}

fn run_scan(mut config: RunConfig, args: ScanArgs) -> anyhow::Result<i32> {
    if let Some(min_confidence) = args.min_confidence {
        config.min_confidence = min_confidence;
    }

    let mut orchestrator = Orchestrator::new(args.base_path.clone(), config.clone());
    let reporter = CliReporter::new();
    let report = orchestrator
        .scan_only(&reporter)
        .with_context(|| format!("scan of {} failed", args.base_path.display()))?;

    let mut stdout = io::stdout();
    for (index, group) in report.groups.iter().enumerate() {
        render::write_group(&mut stdout, group, index, report.groups.len())?;
    }

    println!();
    info!(
        "{} folders scanned, {} groups at {}% minimum confidence",
        format!("{}", report.folders.len()).cyan(),
        format!("{}", report.groups.len()).green(),
        config.min_confidence,
    );
    for err in &report.errors {
        warn!("{}", err);
    }

    Ok(if report.errors.is_empty() { 0 } else { EXIT_ERROR })
}

fn run_merge(mut config: RunConfig, args: MergeArgs) -> anyhow::Result<i32> {
    if let Some(min_confidence) = args.min_confidence {
        config.min_confidence = min_confidence;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if config.dry_run {
        info!("{}", "DRY RUN: no files will be changed".yellow());
    }

    let mut orchestrator = Orchestrator::new(args.base_path.clone(), config.clone());
    let reporter = CliReporter::new();
    let stdin = io::stdin();
    let mut selector = TerminalSelector::new(stdin.lock(), io::stdout(), config.dry_run);

    let summary = orchestrator
        .run(&mut selector, &reporter)
        .with_context(|| format!("merge in {} failed", args.base_path.display()))?;

    render::print_summary(&summary);

    Ok(if summary.interrupted {
        EXIT_INTERRUPTED
    } else if !summary.errors.is_empty() || !summary.scan_errors.is_empty() {
        EXIT_ERROR
    } else {
        0
    })
}
