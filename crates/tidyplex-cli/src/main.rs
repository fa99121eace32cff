mod commands;
mod logging;
mod progress;

use std::process;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;
use tracing::error;

use commands::{Cli, Commands, OrganizeArgs, PruneArgs, TrackerArgs};
use progress::CliReporter;
use tidyplex_core::{AppConfig, Organizer, Pruner, TrackerProber};

/// 0 clean, 1 fatal, 2 completed with warnings.
const EXIT_FATAL: i32 = 1;
const EXIT_WARNINGS: i32 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(EXIT_FATAL);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Organize(args)) => run_organize(config, args),
        Some(Commands::Prune(args)) => run_prune(config, args),
        Some(Commands::Trackers(args)) => run_trackers(config, args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_organize(mut config: AppConfig, args: OrganizeArgs) {
    if let Some(source) = args.source {
        config.organize.source_dir = Some(source);
    }
    if let Some(mode) = args.mode {
        config.organize.mode = mode;
    }
    if let Some(min_size_mb) = args.min_size_mb {
        config.organize.min_movie_size_mb = min_size_mb;
    }

    let reporter = CliReporter::new();
    match Organizer::new(config.organize).run(&reporter) {
        Ok(summary) if summary.has_warnings() => process::exit(EXIT_WARNINGS),
        Ok(_) => {}
        Err(err) => {
            error!("Error: {}", err);
            process::exit(EXIT_FATAL);
        }
    }
}

fn run_prune(mut config: AppConfig, args: PruneArgs) {
    if let Some(root) = args.root {
        config.prune.root_dir = Some(root);
    }
    if let Some(threshold_kb) = args.threshold_kb {
        config.prune.threshold_kb = threshold_kb;
    }
    if let Some(action) = args.action {
        config.prune.action = action;
    }
    if let Some(recycle_dir) = args.recycle_dir {
        config.prune.recycle_dir = Some(recycle_dir);
    }

    let reporter = CliReporter::new();
    match Pruner::new(config.prune).run(&reporter) {
        Ok(summary) if summary.has_warnings() => process::exit(EXIT_WARNINGS),
        Ok(_) => {}
        Err(err) => {
            error!("Error: {}", err);
            process::exit(EXIT_FATAL);
        }
    }
}

fn run_trackers(mut config: AppConfig, args: TrackerArgs) {
    if let Some(output) = args.output {
        config.trackers.output_file = output;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.trackers.probe_timeout_secs = timeout_secs;
    }
    if let Some(ceiling_ms) = args.ceiling_ms {
        config.trackers.latency_ceiling_ms = ceiling_ms;
    }
    if let Some(concurrency) = args.concurrency {
        config.trackers.max_concurrency = concurrency;
    }

    let reporter = CliReporter::new();
    match TrackerProber::new(config.trackers).run(&reporter) {
        Ok(summary) if summary.has_warnings() => process::exit(EXIT_WARNINGS),
        Ok(_) => {}
        Err(err) => {
            error!("Error: {}", err);
            process::exit(EXIT_FATAL);
        }
    }
}
