//! Per-task execution: encode, decode, measure, clean up.
//!
//! One task is one fully expanded (video, codec, quality, preset)
//! combination. Each step is gated on the previous one; any step failure
//! skips the task (logged, never retried, never fatal to the batch).
//! Transient artifacts are tracked by an RAII guard, so they are removed
//! exactly once on every exit path.
//!
//! The effective source path lives in an immutable per-task [`TaskContext`]
//! built fresh for every task; the shared [`SourceVideo`] is never touched.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{SourceKind, SourceVideo};
use crate::error::{CoreError, CoreResult};
use crate::external::gstreamer::read_passthrough_options;
use crate::external::{Decoder, EncodeRequest, Encoder, QualityScorer, SourceGenerator, Toolchain};
use crate::layout::TaskPaths;

/// One unit of work from the matrix expansion. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub codec: String,
    pub quality_param: u32,
    pub preset: String,
    /// Optional encoder config file with opaque passthrough options.
    pub encoder_config: Option<PathBuf>,
}

/// Per-task options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOptions {
    /// Keep the decoded raw output instead of deleting it after measurement.
    pub retain_intermediates: bool,
}

/// The step at which a task was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// File-backed source does not exist.
    SourceMissing,
    /// Synthetic source generation failed.
    SourceGeneration,
    /// Encoder invocation failed.
    Encode,
    /// Decode/post-processing failed.
    PostProcess,
    /// Quality scoring failed. The encoding log persists, so the harvest
    /// still yields a row for this task, with a null quality score.
    Measure,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::SourceMissing => "source missing",
            SkipReason::SourceGeneration => "source generation failed",
            SkipReason::Encode => "encoding failed",
            SkipReason::PostProcess => "post-processing failed",
            SkipReason::Measure => "quality measurement failed",
        };
        f.write_str(s)
    }
}

/// Durable output of one completed task.
#[derive(Debug, Clone)]
pub struct TaskArtifacts {
    pub encoded: PathBuf,
    pub encoding_log: PathBuf,
    /// Present only when intermediates are retained.
    pub decoded: Option<PathBuf>,
    pub quality_report: PathBuf,
    pub resource_log: PathBuf,
}

/// Result of one task attempt.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(TaskArtifacts),
    Skipped(SkipReason),
}

/// Immutable per-task view of the source: the path collaborators read from,
/// whether file-backed or freshly generated.
struct TaskContext {
    source: PathBuf,
}

/// Removes tracked transient files when dropped. Dropping is the only
/// removal path, so cleanup runs exactly once whether the task completed,
/// skipped, or returned early with an error.
#[derive(Default)]
struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    fn track(&mut self, path: &Path) {
        self.paths.push(path.to_path_buf());
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.exists() {
                log::debug!("Cleaning up transient artifact: {}", path.display());
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("Failed to remove transient artifact {path:?}: {e}");
                }
            }
        }
    }
}

fn log_step_failure(step: &str, error: &CoreError) {
    if error.is_environment_problem() {
        log::error!(
            "[SKIPPING] {step} failed: {error}. This is an environment problem; \
             subsequent tasks will likely fail the same way."
        );
    } else {
        log::error!("[SKIPPING] {step} failed: {error}");
    }
}

/// Executes one task. Classified step failures are reported as
/// [`TaskOutcome::Skipped`]; only unexpected errors (e.g. the task directory
/// cannot be created) propagate as `Err`.
pub fn run_task<G, E, D, S>(
    tools: &Toolchain<G, E, D, S>,
    video: &SourceVideo,
    desc: &TaskDescriptor,
    task_dir: &Path,
    options: &TaskOptions,
) -> CoreResult<TaskOutcome>
where
    G: SourceGenerator,
    E: Encoder,
    D: Decoder,
    S: QualityScorer,
{
    std::fs::create_dir_all(task_dir)?;
    let paths = TaskPaths::new(task_dir, &video.name, &desc.preset);
    let mut cleanup = CleanupGuard::default();

    // Step 1: source resolution.
    let ctx = match video.kind {
        SourceKind::TestSrc => {
            // Track before generating so a partially written file is also
            // removed on failure paths past this point.
            cleanup.track(&paths.temp_source);
            if let Err(e) =
                tools
                    .generator
                    .generate(video, &paths.temp_source, &paths.generation_log)
            {
                log_step_failure("source generation", &e);
                return Ok(TaskOutcome::Skipped(SkipReason::SourceGeneration));
            }
            TaskContext {
                source: paths.temp_source.clone(),
            }
        }
        SourceKind::File => match &video.path {
            Some(path) if path.exists() => TaskContext {
                source: path.clone(),
            },
            other => {
                log::warn!(
                    "[SKIPPING] Source path not found or invalid for '{}': {other:?}",
                    video.name
                );
                return Ok(TaskOutcome::Skipped(SkipReason::SourceMissing));
            }
        },
    };

    // Step 2: encode.
    let passthrough = desc
        .encoder_config
        .as_deref()
        .map(read_passthrough_options)
        .unwrap_or_default();
    let request = EncodeRequest {
        source: &ctx.source,
        codec: &desc.codec,
        quality_param: desc.quality_param,
        preset: &desc.preset,
        passthrough: &passthrough,
        output: &paths.encoded,
        log: &paths.encoding_log,
        resource_log: &paths.resource_log,
    };
    if let Err(e) = tools.encoder.encode(&request) {
        log_step_failure("encoding", &e);
        return Ok(TaskOutcome::Skipped(SkipReason::Encode));
    }

    // Step 3: decode. The decoded raw file exists only to be measured, so it
    // is transient unless the caller asked to retain intermediates. Further
    // filter stages would chain here, raw to raw, before measurement.
    if !options.retain_intermediates {
        cleanup.track(&paths.decoded);
    }
    if let Err(e) = tools
        .decoder
        .decode(&paths.encoded, &paths.decoded, &paths.decode_log)
    {
        log_step_failure("post-processing", &e);
        return Ok(TaskOutcome::Skipped(SkipReason::PostProcess));
    }

    // Step 4: measure the decoded output against the reference source.
    if let Err(e) = tools.scorer.score(
        &paths.decoded,
        &ctx.source,
        &paths.quality_report,
        &paths.scorer_log,
    ) {
        log_step_failure("quality measurement", &e);
        return Ok(TaskOutcome::Skipped(SkipReason::Measure));
    }

    Ok(TaskOutcome::Completed(TaskArtifacts {
        encoded: paths.encoded.clone(),
        encoding_log: paths.encoding_log.clone(),
        decoded: options.retain_intermediates.then(|| paths.decoded.clone()),
        quality_report: paths.quality_report.clone(),
        resource_log: paths.resource_log.clone(),
    }))
}
