//! GStreamer-backed collaborators: test-source generation and encoding.
//!
//! Pipelines are assembled as structured argument lists for `gst-launch-1.0`
//! (each element, property, and `!` link is its own argv item), never as a
//! shell string, so user-controlled names and paths cannot change the
//! pipeline shape.

use std::path::Path;
use std::time::Duration;

use crate::config::SourceVideo;
use crate::error::{CoreError, CoreResult};
use crate::external::codecs;
use crate::external::{run_logged, EncodeRequest, Encoder, SourceGenerator, GST_LAUNCH, TIME_CMD};

/// Frames generated when a synthetic source does not specify a duration.
const DEFAULT_DURATION_SECS: f64 = 5.0;
const DEFAULT_FRAMERATE: u32 = 30;

/// Raw video format for the generator caps filter. 8-bit 4:2:0 is the
/// baseline; 10-bit 4:2:0 maps to its little-endian planar layout.
fn raw_format(video: &SourceVideo) -> &'static str {
    if video.bit_depth == Some(10) && video.chroma_subsampling.as_deref() == Some("4:2:0") {
        "I420_10LE"
    } else {
        "I420"
    }
}

/// Builds the `gst-launch-1.0` argument list producing a Y4M test source.
fn generator_args(video: &SourceVideo, output: &Path) -> CoreResult<Vec<String>> {
    let pattern = video.pattern.as_deref().unwrap_or(codecs::DEFAULT_PATTERN);
    let pattern_id = codecs::pattern_id(pattern)
        .ok_or_else(|| CoreError::UnsupportedPattern(pattern.to_string()))?;

    let framerate = video.framerate.unwrap_or(DEFAULT_FRAMERATE);
    let duration = video.duration_secs.unwrap_or(DEFAULT_DURATION_SECS);
    let num_buffers = (duration * f64::from(framerate)) as u32;
    let (width, height) = video.dimensions()?;

    Ok(vec![
        "-e".into(),
        "videotestsrc".into(),
        format!("pattern={pattern_id}"),
        format!("num-buffers={num_buffers}"),
        "is-live=false".into(),
        "!".into(),
        format!(
            "video/x-raw,format={},width={width},height={height},framerate={framerate}/1",
            raw_format(video)
        ),
        "!".into(),
        "y4menc".into(),
        "!".into(),
        "filesink".into(),
        format!("location={}", output.display()),
    ])
}

/// Source generator backed by GStreamer's `videotestsrc`.
pub struct GstSourceGenerator {
    timeout: Duration,
}

impl GstSourceGenerator {
    pub fn new(timeout: Duration) -> Self {
        GstSourceGenerator { timeout }
    }
}

impl SourceGenerator for GstSourceGenerator {
    fn generate(&self, video: &SourceVideo, output: &Path, log: &Path) -> CoreResult<()> {
        let args = generator_args(video, output)?;
        log::info!(
            "Generating videotestsrc source: {}",
            output.file_name().unwrap_or_default().to_string_lossy()
        );
        let result = run_logged(GST_LAUNCH, &args, log, self.timeout);
        if result.is_err() {
            // A failed pipeline can leave a truncated file behind.
            if output.exists() {
                let _ = std::fs::remove_file(output);
            }
        }
        result
    }
}

/// Builds the `gst-launch-1.0` argument list for one encode.
fn encode_args(request: &EncodeRequest<'_>) -> CoreResult<Vec<String>> {
    let spec = codecs::lookup(request.codec)
        .ok_or_else(|| CoreError::UnsupportedCodec(request.codec.to_string()))?;

    let mut args = vec![
        // INFO-level debug for the encoder element records its effective
        // properties in the encoding log.
        format!("--gst-debug={}:4", spec.element),
        "-e".into(),
        "filesrc".into(),
        format!("location={}", request.source.display()),
        "!".into(),
        "decodebin".into(),
        "!".into(),
        "videoconvert".into(),
        "!".into(),
        spec.element.to_string(),
        format!("speed-preset={}", request.preset),
        (spec.quality_property)(request.quality_param),
    ];
    args.extend(request.passthrough.iter().cloned());
    args.push("!".into());
    if let Some(parser) = spec.parser {
        args.push(parser.to_string());
        args.push("!".into());
    }
    args.push("mp4mux".into());
    args.push("!".into());
    args.push("filesink".into());
    args.push(format!("location={}", request.output.display()));
    Ok(args)
}

/// Encoder backed by `gst-launch-1.0`, wrapped in `/usr/bin/time -v` so each
/// encode leaves a resource-usage log next to its encoding log.
pub struct GstEncoder {
    timeout: Duration,
}

impl GstEncoder {
    pub fn new(timeout: Duration) -> Self {
        GstEncoder { timeout }
    }
}

impl Encoder for GstEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> CoreResult<()> {
        let mut args = vec![
            "-v".to_string(),
            "-o".to_string(),
            request.resource_log.display().to_string(),
            GST_LAUNCH.to_string(),
        ];
        args.extend(encode_args(request)?);
        run_logged(TIME_CMD, &args, request.log, self.timeout)
    }
}

/// Reads an encoder config file into passthrough options: one option per
/// non-blank, non-comment line, passed verbatim to the encoder element.
///
/// An unreadable file is a warning, not a task failure; the encode proceeds
/// without passthrough options.
pub fn read_passthrough_options(path: &Path) -> Vec<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Could not read encoder config file {path:?}: {e}");
            return Vec::new();
        }
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;
    use std::io::Write;
    use std::path::PathBuf;

    fn testsrc_video() -> SourceVideo {
        SourceVideo {
            name: "ball".into(),
            kind: SourceKind::TestSrc,
            path: None,
            resolution: "1280x720".into(),
            resolution_name: "720p".into(),
            bit_depth: None,
            chroma_subsampling: None,
            framerate: Some(30),
            duration_secs: Some(2.0),
            pattern: Some("ball".into()),
        }
    }

    #[test]
    fn generator_args_encode_pattern_and_caps() {
        let args = generator_args(&testsrc_video(), Path::new("/tmp/out.y4m")).unwrap();
        assert!(args.contains(&"pattern=18".to_string()));
        assert!(args.contains(&"num-buffers=60".to_string()));
        assert!(args.contains(
            &"video/x-raw,format=I420,width=1280,height=720,framerate=30/1".to_string()
        ));
        assert_eq!(args.last().unwrap(), "location=/tmp/out.y4m");
    }

    #[test]
    fn ten_bit_source_selects_10le_format() {
        let mut video = testsrc_video();
        video.bit_depth = Some(10);
        video.chroma_subsampling = Some("4:2:0".into());
        assert_eq!(raw_format(&video), "I420_10LE");
    }

    #[test]
    fn encode_args_for_x265_include_parser() {
        let passthrough = vec!["tune=zerolatency".to_string()];
        let request = EncodeRequest {
            source: Path::new("/tmp/src.y4m"),
            codec: "libx265",
            quality_param: 30,
            preset: "fast",
            passthrough: &passthrough,
            output: Path::new("/tmp/out.mp4"),
            log: Path::new("/tmp/out_encoding.log"),
            resource_log: Path::new("/tmp/out_time.log"),
        };
        let args = encode_args(&request).unwrap();
        assert_eq!(args[0], "--gst-debug=x265enc:4");
        assert!(args.contains(&"qp=30".to_string()));
        assert!(args.contains(&"speed-preset=fast".to_string()));
        assert!(args.contains(&"tune=zerolatency".to_string()));
        assert!(args.contains(&"h265parse".to_string()));
    }

    #[test]
    fn encode_args_reject_unknown_codec() {
        let request = EncodeRequest {
            source: Path::new("/tmp/src.y4m"),
            codec: "libvp9",
            quality_param: 30,
            preset: "medium",
            passthrough: &[],
            output: Path::new("/tmp/out.mp4"),
            log: Path::new("/tmp/out_encoding.log"),
            resource_log: Path::new("/tmp/out_time.log"),
        };
        assert!(matches!(
            encode_args(&request),
            Err(CoreError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn passthrough_strips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# x264 tuning").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "bframes=3").unwrap();
        writeln!(file, "  ref=4  ").unwrap();
        let options = read_passthrough_options(file.path());
        assert_eq!(options, vec!["bframes=3", "ref=4"]);
    }

    #[test]
    fn missing_passthrough_file_yields_empty_options() {
        let options = read_passthrough_options(&PathBuf::from("/nonexistent/enc.cfg"));
        assert!(options.is_empty());
    }
}
