//! Core library for the VAF codec-comparison pipeline.
//!
//! VAF expands a declarative experiment matrix (source videos × codecs ×
//! quality parameters × presets) into independent encode/decode/measure
//! tasks driven through external tools, harvests the per-task artifacts into
//! a normalized CSV dataset, and computes BD-Rate between codec pairs.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vaf_core::{load_config, Experiment, SystemToolchain, TaskOptions};
//! use vaf_core::external::{resolve_model_path, DEFAULT_INVOCATION_TIMEOUT};
//!
//! let config = load_config(Path::new("configs/my_test.yml")).unwrap();
//! let experiment = Experiment::new(config, TaskOptions::default()).unwrap();
//! let tools = SystemToolchain::system(resolve_model_path(None), DEFAULT_INVOCATION_TIMEOUT);
//! let summary = experiment.run(&tools).unwrap();
//! println!("{} task(s) completed, {} skipped", summary.completed, summary.skipped);
//! ```

pub mod bdrate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod experiment;
pub mod external;
pub mod harvest;
pub mod layout;

// Re-exports for the public API
pub use bdrate::{bd_rate, bd_rate_by};
pub use config::{load_config, ExperimentConfig, SourceKind, SourceVideo, TaskDef};
pub use dataset::{read_dataset, write_dataset, ResultRecord};
pub use error::{CoreError, CoreResult};
pub use executor::{run_task, SkipReason, TaskDescriptor, TaskOptions, TaskOutcome};
pub use experiment::{Experiment, RunSummary};
pub use external::{SystemToolchain, Toolchain};
pub use harvest::harvest_results;
