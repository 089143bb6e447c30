//! FFmpeg-backed collaborators: decoding and libvmaf quality scoring.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreResult;
use crate::external::{run_logged, Decoder, QualityScorer, FFMPEG};

/// Environment variable consulted when no explicit scoring model is
/// configured. Read once at startup by [`resolve_model_path`], never from
/// deep call paths.
pub const VMAF_MODEL_ENV: &str = "VMAF_MODEL_PATH";

/// Model used when neither the configuration nor the environment provides one.
pub const DEFAULT_VMAF_MODEL: &str = "/usr/local/share/vmaf/model/vmaf_v0.6.1.json";

/// Resolves the quality-scoring model path once, at startup. Precedence:
/// explicit configuration, then the environment variable, then the default
/// install location. A candidate that does not exist on disk is skipped with
/// a log message; `None` means libvmaf runs with its built-in model lookup,
/// which may fail at scoring time.
pub fn resolve_model_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            log::info!("Using VMAF model: {}", path.display());
            return Some(path);
        }
        log::warn!("Configured VMAF model {path:?} does not exist, ignoring");
    }

    if let Some(path) = std::env::var_os(VMAF_MODEL_ENV).map(PathBuf::from) {
        if path.exists() {
            log::info!("Using VMAF model from {VMAF_MODEL_ENV}: {}", path.display());
            return Some(path);
        }
        log::warn!("{VMAF_MODEL_ENV} points at {path:?} which does not exist, ignoring");
    }

    let default = PathBuf::from(DEFAULT_VMAF_MODEL);
    if default.exists() {
        log::info!("Using default VMAF model: {DEFAULT_VMAF_MODEL}");
        return Some(default);
    }

    log::warn!("No VMAF model found; quality scoring may fail.");
    None
}

/// Decoder producing a raw Y4M comparison file from an encoded artifact.
pub struct FfmpegDecoder {
    timeout: Duration,
}

impl FfmpegDecoder {
    pub fn new(timeout: Duration) -> Self {
        FfmpegDecoder { timeout }
    }
}

impl Decoder for FfmpegDecoder {
    fn decode(&self, encoded: &Path, output: &Path, log: &Path) -> CoreResult<()> {
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            encoded.display().to_string(),
            output.display().to_string(),
        ];
        run_logged(FFMPEG, &args, log, self.timeout)
    }
}

/// Escapes a path for use inside a lavfi option value, where `:` separates
/// options.
fn escape_lavfi_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/").replace(':', "\\:")
}

/// Builds the libvmaf filtergraph. Both inputs are re-based to a zero start
/// timestamp so container offsets do not misalign the comparison.
fn vmaf_filtergraph(report: &Path, model: Option<&Path>) -> String {
    let model_option = model
        .map(|m| format!(":model='path={}'", escape_lavfi_path(m)))
        .unwrap_or_default();
    format!(
        "[0:v]setpts=PTS-STARTPTS[dist];[1:v]setpts=PTS-STARTPTS[ref];\
         [dist][ref]libvmaf=log_path='{}':log_fmt=xml:n_threads=4{}",
        escape_lavfi_path(report),
        model_option
    )
}

/// Quality scorer backed by FFmpeg's libvmaf filter, producing an XML report
/// with one `<metric name mean>` element per metric.
pub struct FfmpegQualityScorer {
    model_path: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegQualityScorer {
    pub fn new(model_path: Option<PathBuf>, timeout: Duration) -> Self {
        FfmpegQualityScorer {
            model_path,
            timeout,
        }
    }
}

impl QualityScorer for FfmpegQualityScorer {
    fn score(
        &self,
        candidate: &Path,
        reference: &Path,
        report: &Path,
        log: &Path,
    ) -> CoreResult<()> {
        let graph = vmaf_filtergraph(report, self.model_path.as_deref());
        let args = vec![
            "-i".to_string(),
            candidate.display().to_string(),
            "-i".to_string(),
            reference.display().to_string(),
            "-lavfi".to_string(),
            graph,
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        log::info!("Running VMAF, report: {}", report.display());
        run_logged(FFMPEG, &args, log, self.timeout)
    }
}
