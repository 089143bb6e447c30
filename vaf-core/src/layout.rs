//! Results-tree layout contract.
//!
//! The orchestrator writes artifacts into a nested directory structure and
//! the harvester later recovers each task's identity from artifact paths
//! alone. That coupling is deliberate, and this module is its single owner:
//! both sides go through the constants and functions here, so the layout
//! cannot drift in one place without the other.
//!
//! Layout, relative to the results root:
//!
//! ```text
//! <codec>/<quality_param>/<resolution_name>/<video_name>/
//!     <video>_<preset>.mp4              encoded media
//!     <video>_<preset>_encoding.log     encoder output (bitrate= line)
//!     <video>_<preset>_time.log         /usr/bin/time resource usage
//!     <video>_<preset>_decoded.y4m      decoded raw output (transient)
//!     <video>_<preset>_vmaf.xml         quality report
//!     temp_ref_<video>.y4m              generated source (transient)
//! ```
//!
//! The preset is the filename segment following the first `_`; video names
//! must therefore not contain underscores if the preset is to be recovered.

use std::path::{Path, PathBuf};

/// Suffix identifying the durable per-task record the harvester keys on.
pub const ENCODING_LOG_SUFFIX: &str = "_encoding.log";

/// Suffix of the structured quality report written next to the encoding log.
pub const QUALITY_REPORT_SUFFIX: &str = "_vmaf.xml";

/// Name of the dataset file written at the results root.
pub const DATASET_FILENAME: &str = "combined_data.csv";

/// Number of directory levels between the results root and a task directory.
/// codec / quality_param / resolution_name (the video-name level is not part
/// of the grouping key).
pub const KEY_SEGMENTS: usize = 3;

/// Directory for one task, nested so that the grouping key can be read back
/// off the path.
pub fn task_dir(
    root: &Path,
    codec: &str,
    quality_param: u32,
    resolution_name: &str,
    video_name: &str,
) -> PathBuf {
    root.join(codec)
        .join(quality_param.to_string())
        .join(resolution_name)
        .join(video_name)
}

/// All artifact paths of one task, derived from the task directory and the
/// `<video>_<preset>` base name.
#[derive(Debug, Clone)]
pub struct TaskPaths {
    pub encoded: PathBuf,
    pub encoding_log: PathBuf,
    pub resource_log: PathBuf,
    pub decoded: PathBuf,
    pub decode_log: PathBuf,
    pub quality_report: PathBuf,
    pub scorer_log: PathBuf,
    pub temp_source: PathBuf,
    pub generation_log: PathBuf,
}

impl TaskPaths {
    pub fn new(dir: &Path, video_name: &str, preset: &str) -> Self {
        let base = format!("{video_name}_{preset}");
        TaskPaths {
            encoded: dir.join(format!("{base}.mp4")),
            encoding_log: dir.join(format!("{base}{ENCODING_LOG_SUFFIX}")),
            resource_log: dir.join(format!("{base}_time.log")),
            decoded: dir.join(format!("{base}_decoded.y4m")),
            decode_log: dir.join(format!("{base}_decode.log")),
            quality_report: dir.join(format!("{base}{QUALITY_REPORT_SUFFIX}")),
            scorer_log: dir.join(format!("{base}_vmaf_stderr.log")),
            temp_source: dir.join(format!("temp_ref_{video_name}.y4m")),
            generation_log: dir.join(format!("temp_ref_{video_name}_generation.log")),
        }
    }
}

/// Grouping key of one result row, recovered from an encoding-log path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskKey {
    pub codec: String,
    pub quality_param: String,
    pub resolution: String,
    pub preset: String,
}

impl TaskKey {
    /// Inverts [`task_dir`] + [`TaskPaths::new`]: reads the grouping key off
    /// an encoding log's position in the results tree.
    ///
    /// Returns `None` for logs that are not nested at least [`KEY_SEGMENTS`]
    /// deep below the root (a malformed or foreign directory, not an error)
    /// or whose filename does not carry a preset segment.
    pub fn from_log_path(root: &Path, log_path: &Path) -> Option<TaskKey> {
        let rel = log_path.parent()?.strip_prefix(root).ok()?;
        let segments: Vec<&str> = rel
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        if segments.len() < KEY_SEGMENTS {
            return None;
        }

        let file_name = log_path.file_name()?.to_str()?;
        let base = file_name.strip_suffix(ENCODING_LOG_SUFFIX)?;
        let preset = base.split('_').nth(1)?;

        Some(TaskKey {
            codec: segments[0].to_string(),
            quality_param: segments[1].to_string(),
            resolution: segments[2].to_string(),
            preset: preset.to_string(),
        })
    }
}

/// Path of the quality report sibling of an encoding log.
pub fn quality_report_for(log_path: &Path) -> Option<PathBuf> {
    let file_name = log_path.file_name()?.to_str()?;
    let base = file_name.strip_suffix(ENCODING_LOG_SUFFIX)?;
    Some(log_path.with_file_name(format!("{base}{QUALITY_REPORT_SUFFIX}")))
}
