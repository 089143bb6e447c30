// vaf-cli/src/cli.rs
//
// Command-line argument definitions for the `vaf` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "VAF: video codec comparison pipeline",
    long_about = "Expands a declarative experiment matrix into encode/decode/measure tasks, \
                  harvests the results into a dataset, and computes BD-Rate between codecs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs an experiment described by a configuration file
    Run(RunArgs),
    /// Re-processes an existing results directory into a fresh dataset
    Reprocess(ReprocessArgs),
    /// Computes BD-Rate between two codecs from a dataset file
    BdRate(BdRateArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the experiment configuration file (e.g. configs/my_test.yml)
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Keep decoded raw files instead of deleting them after measurement
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Per-invocation timeout for external tools, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Explicit VMAF model path (takes precedence over VMAF_MODEL_PATH)
    #[arg(long, value_name = "FILE")]
    pub vmaf_model: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ReprocessArgs {
    /// Timestamped results directory to re-process
    #[arg(long, value_name = "DIR")]
    pub results_dir: PathBuf,
}

#[derive(Parser, Debug)]
pub struct BdRateArgs {
    /// Dataset file (combined_data.csv) to read
    #[arg(long, value_name = "FILE")]
    pub dataset: PathBuf,

    /// Reference codec
    #[arg(long, value_name = "CODEC")]
    pub anchor: String,

    /// Codec to compare against the anchor
    #[arg(long, value_name = "CODEC")]
    pub test: String,
}
