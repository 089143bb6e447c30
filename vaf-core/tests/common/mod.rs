// vaf-core/tests/common/mod.rs
//
// Mock collaborator implementations shared by the executor and experiment
// integration tests. Each mock records its calls and produces the dummy
// artifacts the real tool would leave behind, so the harvester can run over
// the resulting tree.

use std::cell::{Cell, RefCell};
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;

use vaf_core::config::SourceVideo;
use vaf_core::error::{CoreError, CoreResult};
use vaf_core::external::{
    Decoder, EncodeRequest, Encoder, QualityScorer, SourceGenerator, Toolchain,
};

fn command_failed(tool: &str, log: &Path) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.to_string(),
        status: ExitStatus::from_raw(1 << 8),
        log: log.to_path_buf(),
    }
}

#[derive(Default)]
pub struct MockGenerator {
    pub fail: Cell<bool>,
    pub calls: Cell<usize>,
}

impl SourceGenerator for MockGenerator {
    fn generate(&self, _video: &SourceVideo, output: &Path, log: &Path) -> CoreResult<()> {
        self.calls.set(self.calls.get() + 1);
        fs::write(log, "videotestsrc generation log\n")?;
        if self.fail.get() {
            return Err(command_failed("gst-launch-1.0", log));
        }
        fs::write(output, "YUV4MPEG2 W1280 H720 F30:1\n")?;
        Ok(())
    }
}

/// Encoder mock. A failing encode still writes its encoding log (the real
/// invocation creates the log before the child runs) but without the
/// `bitrate=` summary line, and exits without producing media.
#[derive(Default)]
pub struct MockEncoder {
    pub fail_on_quality: Cell<Option<u32>>,
    pub calls: RefCell<Vec<(String, u32, String)>>,
}

impl MockEncoder {
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Encoder for MockEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> CoreResult<()> {
        self.calls.borrow_mut().push((
            request.codec.to_string(),
            request.quality_param,
            request.preset.to_string(),
        ));

        if self.fail_on_quality.get() == Some(request.quality_param) {
            fs::write(request.log, "pipeline error: internal data stream error\n")?;
            return Err(command_failed("gst-launch-1.0", request.log));
        }

        // Bitrate falls as the quality parameter rises, like a real encoder.
        let bitrate = 40000.0 / f64::from(request.quality_param);
        fs::write(
            request.log,
            format!("Setting pipeline to PLAYING\nbitrate= {bitrate:.1} kbits/s\n"),
        )?;
        fs::write(request.resource_log, "Elapsed (wall clock) time: 0:01.00\n")?;
        fs::write(request.output, b"mp4")?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDecoder {
    pub fail: Cell<bool>,
    pub calls: Cell<usize>,
}

impl Decoder for MockDecoder {
    fn decode(&self, _encoded: &Path, output: &Path, log: &Path) -> CoreResult<()> {
        self.calls.set(self.calls.get() + 1);
        fs::write(log, "ffmpeg decode log\n")?;
        if self.fail.get() {
            return Err(command_failed("ffmpeg", log));
        }
        fs::write(output, "YUV4MPEG2 decoded\n")?;
        Ok(())
    }
}

pub struct MockScorer {
    pub fail: Cell<bool>,
    pub mean_score: Cell<f64>,
    pub calls: Cell<usize>,
}

impl Default for MockScorer {
    fn default() -> Self {
        MockScorer {
            fail: Cell::new(false),
            mean_score: Cell::new(93.0),
            calls: Cell::new(0),
        }
    }
}

impl QualityScorer for MockScorer {
    fn score(
        &self,
        _candidate: &Path,
        _reference: &Path,
        report: &Path,
        log: &Path,
    ) -> CoreResult<()> {
        self.calls.set(self.calls.get() + 1);
        fs::write(log, "ffmpeg vmaf log\n")?;
        if self.fail.get() {
            return Err(command_failed("ffmpeg", log));
        }
        fs::write(
            report,
            format!(
                r#"<?xml version="1.0"?>
<vmaf version="2.3.1">
  <pooled_metrics>
    <metric name="vmaf" min="80.0" max="99.0" mean="{:.3}" />
  </pooled_metrics>
</vmaf>"#,
                self.mean_score.get()
            ),
        )?;
        Ok(())
    }
}

pub type MockToolchain = Toolchain<MockGenerator, MockEncoder, MockDecoder, MockScorer>;

pub fn mock_toolchain() -> MockToolchain {
    Toolchain {
        generator: MockGenerator::default(),
        encoder: MockEncoder::default(),
        decoder: MockDecoder::default(),
        scorer: MockScorer::default(),
    }
}

/// A file-backed source video pointing at `path`.
pub fn file_video(name: &str, path: &Path) -> SourceVideo {
    SourceVideo {
        name: name.to_string(),
        kind: vaf_core::SourceKind::File,
        path: Some(path.to_path_buf()),
        resolution: "1920x1080".to_string(),
        resolution_name: "1080p".to_string(),
        bit_depth: None,
        chroma_subsampling: None,
        framerate: None,
        duration_secs: None,
        pattern: None,
    }
}

/// A synthetic videotestsrc source video.
pub fn testsrc_video(name: &str) -> SourceVideo {
    SourceVideo {
        name: name.to_string(),
        kind: vaf_core::SourceKind::TestSrc,
        path: None,
        resolution: "1280x720".to_string(),
        resolution_name: "720p".to_string(),
        bit_depth: None,
        chroma_subsampling: None,
        framerate: Some(30),
        duration_secs: Some(2.0),
        pattern: Some("ball".to_string()),
    }
}
