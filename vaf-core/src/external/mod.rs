//! External collaborator invocation.
//!
//! Every heavy step of a task (source generation, encoding, decoding,
//! quality scoring) is an external process invoked as a black box and judged
//! by its exit status. This module owns the pieces all of them share:
//!
//! - [`check_dependency`]: probes for a tool binary, distinguishing an
//!   environment problem (not installed) from a start failure.
//! - [`run_logged`]: spawns a structured argument list (never a shell),
//!   redirects all process output into a log file, and enforces a bounded
//!   per-invocation timeout. A hung external process therefore fails the one
//!   task instead of blocking the run forever.
//! - The collaborator traits ([`SourceGenerator`], [`Encoder`], [`Decoder`],
//!   [`QualityScorer`]) and the [`Toolchain`] bundle the executor is generic
//!   over, so tests can substitute mock implementations.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::SourceVideo;
use crate::error::{CoreError, CoreResult};

pub mod codecs;
pub mod ffmpeg;
pub mod gstreamer;

pub use ffmpeg::{FfmpegDecoder, FfmpegQualityScorer, resolve_model_path};
pub use gstreamer::{GstEncoder, GstSourceGenerator};

/// GStreamer pipeline launcher used for generation and encoding.
pub const GST_LAUNCH: &str = "gst-launch-1.0";

/// FFmpeg binary used for decoding and quality scoring.
pub const FFMPEG: &str = "ffmpeg";

/// GNU time binary used to capture per-encode resource usage.
pub const TIME_CMD: &str = "/usr/bin/time";

/// Tools a full run needs. Checked up front by the CLI; a missing tool is
/// reported prominently but does not prevent the attempt, matching the
/// per-task containment policy.
pub const REQUIRED_TOOLS: &[&str] = &[GST_LAUNCH, FFMPEG, TIME_CMD];

/// Upper bound applied to a single external invocation when the caller does
/// not configure one.
pub const DEFAULT_INVOCATION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Interval at which a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Checks that a required external command is available and executable by
/// running it with `-version`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{cmd_name}' not found.");
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            Err(CoreError::CommandStart {
                tool: cmd_name.to_string(),
                source: e,
            })
        }
    }
}

/// Runs `tool` with `args`, writing stdout and stderr into `log_path`.
///
/// The log file is created before the child starts, so even a failed
/// invocation leaves a durable record at the expected location. The child is
/// polled rather than waited on so a hang can be converted into a
/// [`CoreError::CommandTimeout`]; on expiry the child is killed and reaped.
pub(crate) fn run_logged(
    tool: &str,
    args: &[String],
    log_path: &Path,
    timeout: Duration,
) -> CoreResult<()> {
    let log_file = File::create(log_path)?;
    let log_file_err = log_file.try_clone()?;

    log::debug!("Running: {tool} {}", args.join(" "));

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err))
        .spawn()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                CoreError::DependencyNotFound(tool.to_string())
            } else {
                CoreError::CommandStart {
                    tool: tool.to_string(),
                    source: e,
                }
            }
        })?;

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() > timeout {
            log::error!(
                "'{tool}' still running after {}s, killing it",
                timeout.as_secs()
            );
            child.kill()?;
            child.wait()?;
            return Err(CoreError::CommandTimeout {
                tool: tool.to_string(),
                limit_secs: timeout.as_secs(),
                log: log_path.to_path_buf(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    if status.success() {
        Ok(())
    } else {
        Err(CoreError::CommandFailed {
            tool: tool.to_string(),
            status,
            log: log_path.to_path_buf(),
        })
    }
}

/// Parameters of one encode invocation, assembled by the task executor.
#[derive(Debug)]
pub struct EncodeRequest<'a> {
    pub source: &'a Path,
    pub codec: &'a str,
    pub quality_param: u32,
    pub preset: &'a str,
    /// Opaque passthrough options read verbatim from the task's encoder
    /// config file. Not interpreted here.
    pub passthrough: &'a [String],
    pub output: &'a Path,
    pub log: &'a Path,
    pub resource_log: &'a Path,
}

/// Materializes a synthetic source video into a raw file.
pub trait SourceGenerator {
    fn generate(&self, video: &SourceVideo, output: &Path, log: &Path) -> CoreResult<()>;
}

/// Encodes a raw source with one (codec, quality, preset) combination.
pub trait Encoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> CoreResult<()>;
}

/// Decodes an encoded artifact back to a raw comparison file.
///
/// Extension point: further filter stages (enhancement, resampling) are
/// expected to chain after decoding, each mapping a raw file to a new raw
/// file, before measurement.
pub trait Decoder {
    fn decode(&self, encoded: &Path, output: &Path, log: &Path) -> CoreResult<()>;
}

/// Scores a candidate raw file against the reference source, writing a
/// structured report.
pub trait QualityScorer {
    fn score(&self, candidate: &Path, reference: &Path, report: &Path, log: &Path)
        -> CoreResult<()>;
}

/// The four collaborators a task needs, bundled so the executor and the
/// orchestrator stay generic over concrete implementations.
pub struct Toolchain<G, E, D, S> {
    pub generator: G,
    pub encoder: E,
    pub decoder: D,
    pub scorer: S,
}

/// Toolchain backed by the real external tools.
pub type SystemToolchain = Toolchain<GstSourceGenerator, GstEncoder, FfmpegDecoder, FfmpegQualityScorer>;

impl SystemToolchain {
    /// Builds the production toolchain. `model_path` is the quality-scoring
    /// model resolved once at startup (see [`resolve_model_path`]); `timeout`
    /// bounds every external invocation.
    pub fn system(model_path: Option<PathBuf>, timeout: Duration) -> Self {
        Toolchain {
            generator: GstSourceGenerator::new(timeout),
            encoder: GstEncoder::new(timeout),
            decoder: FfmpegDecoder::new(timeout),
            scorer: FfmpegQualityScorer::new(model_path, timeout),
        }
    }
}
