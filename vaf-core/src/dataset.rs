//! Normalized dataset: result records and CSV persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::layout::DATASET_FILENAME;

/// One row of the normalized dataset. A `None` metric means the
/// corresponding artifact was missing or unparseable; values are never
/// fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub codec: String,
    pub quality_param: String,
    pub resolution: String,
    pub preset: String,
    pub bitrate_kbps: Option<f64>,
    pub quality_score: Option<f64>,
}

/// Writes the dataset as `combined_data.csv` at the results root, preserving
/// record order. An empty harvest is diagnosed but writes nothing and is not
/// an error; returns the written path otherwise.
pub fn write_dataset(root: &Path, records: &[ResultRecord]) -> CoreResult<Option<PathBuf>> {
    if records.is_empty() {
        log::warn!(
            "No results were harvested from {}; check the directory structure and the logs. \
             No dataset written.",
            root.display()
        );
        return Ok(None);
    }

    let path = root.join(DATASET_FILENAME);
    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    log::info!("Wrote {} row(s) to {}", records.len(), path.display());
    Ok(Some(path))
}

/// Reads a previously written dataset, e.g. for standalone BD-Rate
/// computation.
pub fn read_dataset(path: &Path) -> CoreResult<Vec<ResultRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}
