//! Artifact harvesting: results tree to result records.
//!
//! The harvester walks a results root and turns every encoding log it finds
//! into one [`ResultRecord`], recovering the grouping key from the log's
//! path position (see [`crate::layout`]) and the metrics from the log text
//! and the sibling quality report. Either metric extraction may legitimately
//! fail; that yields a `None` field, never an aborted harvest.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::dataset::ResultRecord;
use crate::error::CoreResult;
use crate::layout::{self, TaskKey, ENCODING_LOG_SUFFIX};

/// Metric read from the quality report.
pub const QUALITY_METRIC: &str = "vmaf";

/// The encoder's summary line carries `bitrate= <n> kbits/s`.
static BITRATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bitrate=\s*(\d+\.?\d*)\s*kbits/s").unwrap());

/// Extracts the bitrate from encoding-log text.
fn extract_bitrate(log_text: &str) -> Option<f64> {
    BITRATE_RE
        .captures(log_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reads the named metric's mean from a quality-report XML file. Any failure
/// (missing file, malformed XML, absent element or attribute) yields `None`.
fn extract_metric_mean(report_path: &Path, metric: &str) -> Option<f64> {
    let text = std::fs::read_to_string(report_path).ok()?;
    let doc = roxmltree::Document::parse(&text).ok()?;
    doc.descendants()
        .find(|n| n.has_tag_name("metric") && n.attribute("name") == Some(metric))?
        .attribute("mean")?
        .parse()
        .ok()
}

/// Recursively scans `root` and builds one record per encoding log.
///
/// Logs nested fewer than three directories deep are foreign material and
/// are skipped silently. Entries are visited in filename order so the
/// harvest is deterministic.
pub fn harvest_results(root: &Path) -> CoreResult<Vec<ResultRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.ends_with(ENCODING_LOG_SUFFIX) {
            continue;
        }

        let Some(key) = TaskKey::from_log_path(root, entry.path()) else {
            log::debug!(
                "Skipping encoding log outside the expected layout: {}",
                entry.path().display()
            );
            continue;
        };

        let bitrate_kbps = std::fs::read_to_string(entry.path())
            .ok()
            .as_deref()
            .and_then(extract_bitrate);
        let quality_score = layout::quality_report_for(entry.path())
            .and_then(|report| extract_metric_mean(&report, QUALITY_METRIC));

        records.push(ResultRecord {
            codec: key.codec,
            quality_param: key.quality_param,
            resolution: key.resolution,
            preset: key.preset,
            bitrate_kbps,
            quality_score,
        });
    }

    log::info!("Harvested {} result record(s)", records.len());
    Ok(records)
}
