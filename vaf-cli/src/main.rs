// vaf-cli/src/main.rs
//
// Entry point for the `vaf` binary. Responsibilities:
// - Parsing command-line arguments (`run`, `reprocess`, `bd-rate`).
// - Setting up logging to console and, for runs, to a per-run log file.
// - Loading and validating the experiment configuration.
// - Invoking the vaf-core experiment engine and analytics.
// - Mapping results and errors to process exit codes.

mod cli;
mod logging;

use clap::Parser;
use cli::{BdRateArgs, Cli, Commands, ReprocessArgs, RunArgs};
use log::{error, info, warn};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use vaf_core::external::{check_dependency, resolve_model_path, DEFAULT_INVOCATION_TIMEOUT, REQUIRED_TOOLS};
use vaf_core::{
    bd_rate, harvest_results, load_config, read_dataset, write_dataset, Experiment,
    SystemToolchain, TaskOptions,
};

fn main() -> ExitCode {
    let args = Cli::parse();
    let start_time = Instant::now();

    let result = match args.command {
        Commands::Run(args) => run_experiment(args),
        Commands::Reprocess(args) => reprocess(args),
        Commands::BdRate(args) => compute_bd_rate(args),
    };

    match result {
        Ok(()) => {
            info!("Done in {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The logger may not be initialized yet when e.g. the config
            // fails to load, so report on stderr as well.
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_experiment(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    let options = TaskOptions {
        retain_intermediates: args.keep_intermediates,
    };
    let experiment = Experiment::new(config, options)?;

    let log_path = experiment
        .results_root()
        .join(format!("vaf_{}.log", logging::get_timestamp()));
    logging::setup_logging(Some(&log_path))?;
    info!("Results will be saved in: {}", experiment.results_root().display());

    for tool in REQUIRED_TOOLS {
        if let Err(e) = check_dependency(tool) {
            warn!("{e}. Tasks depending on it will fail.");
        }
    }

    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_INVOCATION_TIMEOUT);
    let tools = SystemToolchain::system(resolve_model_path(args.vmaf_model), timeout);

    let summary = experiment.run(&tools)?;
    info!(
        "Experiment complete: {} task(s) completed, {} skipped, {} dataset row(s).",
        summary.completed, summary.skipped, summary.dataset_rows
    );
    if let Some(path) = &summary.dataset_path {
        info!("Dataset: {}", path.display());
    }
    Ok(())
}

fn reprocess(args: ReprocessArgs) -> Result<(), Box<dyn std::error::Error>> {
    logging::setup_logging(None)?;

    if !args.results_dir.is_dir() {
        return Err(format!(
            "Results directory not found at '{}'",
            args.results_dir.display()
        )
        .into());
    }

    info!("Re-processing results from: {}", args.results_dir.display());
    let records = harvest_results(&args.results_dir)?;
    if let Some(path) = write_dataset(&args.results_dir, &records)? {
        info!("Dataset rewritten: {}", path.display());
    }
    Ok(())
}

fn compute_bd_rate(args: BdRateArgs) -> Result<(), Box<dyn std::error::Error>> {
    logging::setup_logging(None)?;

    let records = read_dataset(&args.dataset)?;
    match bd_rate(&records, &args.anchor, &args.test) {
        Some(value) => {
            println!(
                "BD-Rate of {} vs {}: {value:.2}% (negative means {} needs less bitrate at equal quality)",
                args.test, args.anchor, args.test
            );
        }
        None => {
            println!(
                "BD-Rate of {} vs {} could not be computed; see the warnings above.",
                args.test, args.anchor
            );
        }
    }
    Ok(())
}
