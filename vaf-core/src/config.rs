//! Experiment configuration structures and validation.
//!
//! An experiment is described declaratively in a YAML file: a list of source
//! videos crossed with a list of encoding task definitions. Instances are
//! created by the consumer of the library (e.g. vaf-cli) via [`load_config`]
//! and passed to [`crate::experiment::Experiment`].
//!
//! Validation happens once at load time so that precondition problems
//! (unknown codec, unknown test-source pattern, file source without a path)
//! are reported before any external tool is invoked.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::external::codecs;

/// Top-level experiment description.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// Name used as the prefix of the timestamped results directory.
    pub experiment_name: String,
    /// Directory under which per-run results directories are created.
    pub output_path: PathBuf,
    /// Source videos; the outer axis of the task matrix.
    pub source_videos: Vec<SourceVideo>,
    /// Encoding task definitions; each expands over presets and quality values.
    pub tasks: Vec<TaskDef>,
}

/// How a source video is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SourceKind {
    /// A file on disk; `path` must be set.
    #[default]
    #[serde(rename = "file")]
    File,
    /// Generated on demand from GStreamer's videotestsrc.
    #[serde(rename = "videotestsrc")]
    TestSrc,
}

/// One source video of the experiment matrix.
///
/// This structure is shared, read-only, across all tasks that reference it.
/// Synthetic sources are materialized into a per-task temporary file by the
/// executor; the effective path lives in the executor's task context, never
/// here.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceVideo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: SourceKind,
    /// Path of a file-backed source. Ignored for synthetic sources.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Frame size as `<width>x<height>`, e.g. `1920x1080`.
    pub resolution: String,
    /// Human-readable resolution label used in the results layout, e.g. `1080p`.
    pub resolution_name: String,
    #[serde(default)]
    pub bit_depth: Option<u8>,
    #[serde(default)]
    pub chroma_subsampling: Option<String>,
    #[serde(default)]
    pub framerate: Option<u32>,
    #[serde(rename = "duration_in_sec", default)]
    pub duration_secs: Option<f64>,
    /// videotestsrc pattern name for synthetic sources.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl SourceVideo {
    /// Parses the `WxH` resolution string.
    pub fn dimensions(&self) -> CoreResult<(u32, u32)> {
        let (w, h) = self
            .resolution
            .split_once('x')
            .ok_or_else(|| bad_resolution(&self.name, &self.resolution))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| bad_resolution(&self.name, &self.resolution))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| bad_resolution(&self.name, &self.resolution))?;
        Ok((width, height))
    }
}

fn bad_resolution(name: &str, value: &str) -> CoreError {
    CoreError::Config(format!(
        "source '{name}': resolution '{value}' is not of the form <width>x<height>"
    ))
}

/// One encoding task definition. Expands into
/// `presets × quality_values` task descriptors per source video.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDef {
    pub codec: String,
    /// Quality-parameter sweep (CRF/QP values, codec-dependent semantics).
    #[serde(alias = "crf_values")]
    pub quality_values: Vec<u32>,
    /// One preset or a list of presets; defaults to `medium`.
    #[serde(default = "default_presets", deserialize_with = "one_or_many")]
    pub preset: Vec<String>,
    /// Optional encoder config file whose lines are passed verbatim to the
    /// encoder element (comments and blank lines stripped).
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

fn default_presets() -> Vec<String> {
    vec!["medium".to_string()]
}

/// Accepts either a scalar or a list, mirroring the config file convention
/// where `preset: medium` and `preset: [medium, fast]` are both valid.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(p) => vec![p],
        OneOrMany::Many(ps) => ps,
    })
}

/// Loads and validates an experiment configuration file.
pub fn load_config(path: &Path) -> CoreResult<ExperimentConfig> {
    let text = std::fs::read_to_string(path)?;
    let config: ExperimentConfig = serde_yaml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

impl ExperimentConfig {
    /// Checks the preconditions the executor relies on. Unknown codecs and
    /// patterns are rejected here so the corresponding collaborators are
    /// never invoked with them.
    pub fn validate(&self) -> CoreResult<()> {
        if self.experiment_name.is_empty() {
            return Err(CoreError::Config("experiment_name must not be empty".into()));
        }
        if self.source_videos.is_empty() {
            return Err(CoreError::Config("source_videos must not be empty".into()));
        }
        if self.tasks.is_empty() {
            return Err(CoreError::Config("tasks must not be empty".into()));
        }

        for video in &self.source_videos {
            video.dimensions()?;
            match video.kind {
                SourceKind::File => {
                    if video.path.is_none() {
                        return Err(CoreError::Config(format!(
                            "source '{}': file-backed sources require a path",
                            video.name
                        )));
                    }
                }
                SourceKind::TestSrc => {
                    let pattern = video.pattern.as_deref().unwrap_or(codecs::DEFAULT_PATTERN);
                    if codecs::pattern_id(pattern).is_none() {
                        return Err(CoreError::UnsupportedPattern(pattern.to_string()));
                    }
                }
            }
        }

        for task in &self.tasks {
            if codecs::lookup(&task.codec).is_none() {
                return Err(CoreError::UnsupportedCodec(task.codec.clone()));
            }
            if task.quality_values.is_empty() {
                return Err(CoreError::Config(format!(
                    "task '{}': quality_values must not be empty",
                    task.codec
                )));
            }
            if task.preset.is_empty() {
                return Err(CoreError::Config(format!(
                    "task '{}': preset list must not be empty",
                    task.codec
                )));
            }
        }

        Ok(())
    }
}
