//! Experiment orchestration: matrix expansion and the batch loop.
//!
//! An experiment expands its configuration into tasks in a fixed order
//! (videos outer, task definitions next, presets next, quality values
//! innermost) and runs them strictly sequentially. Classified per-task
//! failures are counted and skipped; after the whole matrix has been
//! attempted, the results tree is harvested and the dataset written exactly
//! once.

use std::path::{Path, PathBuf};

use crate::config::ExperimentConfig;
use crate::dataset::write_dataset;
use crate::error::CoreResult;
use crate::executor::{run_task, TaskDescriptor, TaskOptions, TaskOutcome};
use crate::external::{Decoder, Encoder, QualityScorer, SourceGenerator, Toolchain};
use crate::harvest::harvest_results;
use crate::layout;

/// Aggregate outcome of one run.
#[derive(Debug)]
pub struct RunSummary {
    pub results_root: PathBuf,
    pub completed: usize,
    pub skipped: usize,
    pub dataset_rows: usize,
    /// `None` when the harvest produced no records and nothing was written.
    pub dataset_path: Option<PathBuf>,
}

/// One experiment run bound to a fresh timestamped results directory.
pub struct Experiment {
    config: ExperimentConfig,
    results_root: PathBuf,
    options: TaskOptions,
}

impl Experiment {
    /// Creates the run's results directory
    /// `<output_path>/<experiment_name>_<timestamp>`. The directory must not
    /// already exist; a previous run's directory is never reused.
    pub fn new(config: ExperimentConfig, options: TaskOptions) -> CoreResult<Self> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let results_root = config
            .output_path
            .join(format!("{}_{}", config.experiment_name, timestamp));
        std::fs::create_dir_all(&config.output_path)?;
        std::fs::create_dir(&results_root)?;
        Ok(Experiment {
            config,
            results_root,
            options,
        })
    }

    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    /// Runs every expanded (video, task, preset, quality) combination once,
    /// then harvests the results tree and writes the dataset.
    ///
    /// Only unclassified errors abort the run; everything the error taxonomy
    /// covers is contained at the task level.
    pub fn run<G, E, D, S>(&self, tools: &Toolchain<G, E, D, S>) -> CoreResult<RunSummary>
    where
        G: SourceGenerator,
        E: Encoder,
        D: Decoder,
        S: QualityScorer,
    {
        log::info!(
            "Starting experiment '{}', results in {}",
            self.config.experiment_name,
            self.results_root.display()
        );

        let mut completed = 0;
        let mut skipped = 0;

        for video in &self.config.source_videos {
            for task_def in &self.config.tasks {
                for preset in &task_def.preset {
                    for &quality in &task_def.quality_values {
                        let desc = TaskDescriptor {
                            codec: task_def.codec.clone(),
                            quality_param: quality,
                            preset: preset.clone(),
                            encoder_config: task_def.config_file.clone(),
                        };
                        let task_dir = layout::task_dir(
                            &self.results_root,
                            &desc.codec,
                            desc.quality_param,
                            &video.resolution_name,
                            &video.name,
                        );
                        log::info!(
                            "Task: {} | {} @ {} | preset {}",
                            video.name,
                            desc.codec,
                            desc.quality_param,
                            desc.preset
                        );
                        match run_task(tools, video, &desc, &task_dir, &self.options)? {
                            TaskOutcome::Completed(_) => completed += 1,
                            TaskOutcome::Skipped(reason) => {
                                skipped += 1;
                                log::warn!(
                                    "Task skipped ({reason}): {} {} q{} {}",
                                    video.name,
                                    desc.codec,
                                    desc.quality_param,
                                    desc.preset
                                );
                            }
                        }
                    }
                }
            }
        }

        log::info!("Processing all results...");
        let records = harvest_results(&self.results_root)?;
        let dataset_path = write_dataset(&self.results_root, &records)?;

        Ok(RunSummary {
            results_root: self.results_root.clone(),
            completed,
            skipped,
            dataset_rows: records.len(),
            dataset_path,
        })
    }
}
