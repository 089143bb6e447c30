// vaf-core/tests/executor_tests.rs

mod common;

use common::{file_video, mock_toolchain, testsrc_video};
use std::fs::File;
use std::path::PathBuf;
use tempfile::tempdir;
use vaf_core::executor::{run_task, SkipReason, TaskDescriptor, TaskOptions, TaskOutcome};
use vaf_core::layout::TaskPaths;

fn descriptor() -> TaskDescriptor {
    TaskDescriptor {
        codec: "libx264".to_string(),
        quality_param: 27,
        preset: "medium".to_string(),
        encoder_config: None,
    }
}

#[test]
fn successful_task_produces_artifacts_and_removes_decoded(
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("clip.y4m");
    File::create(&source)?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    let outcome = run_task(
        &tools,
        &file_video("clip", &source),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    let artifacts = match outcome {
        TaskOutcome::Completed(a) => a,
        other => panic!("expected completion, got {other:?}"),
    };
    assert!(artifacts.encoded.exists());
    assert!(artifacts.encoding_log.exists());
    assert!(artifacts.quality_report.exists());
    assert!(artifacts.decoded.is_none());

    // The decoded raw file must be gone once the task returns.
    let paths = TaskPaths::new(&task_dir, "clip", "medium");
    assert!(!paths.decoded.exists());
    Ok(())
}

#[test]
fn retain_intermediates_keeps_decoded_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("clip.y4m");
    File::create(&source)?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    let options = TaskOptions {
        retain_intermediates: true,
    };
    let outcome = run_task(&tools, &file_video("clip", &source), &descriptor(), &task_dir, &options)?;

    match outcome {
        TaskOutcome::Completed(artifacts) => {
            let decoded = artifacts.decoded.expect("decoded path should be reported");
            assert!(decoded.exists());
        }
        other => panic!("expected completion, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_file_source_skips_before_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    let video = file_video("ghost", &PathBuf::from("/nonexistent/ghost.y4m"));
    let outcome = run_task(&tools, &video, &descriptor(), &task_dir, &TaskOptions::default())?;

    assert!(matches!(
        outcome,
        TaskOutcome::Skipped(SkipReason::SourceMissing)
    ));
    assert_eq!(tools.encoder.call_count(), 0);
    assert_eq!(tools.decoder.calls.get(), 0);
    Ok(())
}

#[test]
fn synthetic_source_is_generated_and_cleaned_up() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    let outcome = run_task(
        &tools,
        &testsrc_video("ball"),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    assert!(matches!(outcome, TaskOutcome::Completed(_)));
    assert_eq!(tools.generator.calls.get(), 1);
    let paths = TaskPaths::new(&task_dir, "ball", "medium");
    assert!(!paths.temp_source.exists(), "temp source must be removed");
    assert!(paths.generation_log.exists(), "generation log persists");
    Ok(())
}

#[test]
fn generator_failure_skips_without_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    tools.generator.fail.set(true);
    let outcome = run_task(
        &tools,
        &testsrc_video("ball"),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    assert!(matches!(
        outcome,
        TaskOutcome::Skipped(SkipReason::SourceGeneration)
    ));
    assert_eq!(tools.encoder.call_count(), 0);
    Ok(())
}

#[test]
fn encode_failure_skips_but_leaves_the_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("clip.y4m");
    File::create(&source)?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    tools.encoder.fail_on_quality.set(Some(27));
    let outcome = run_task(
        &tools,
        &file_video("clip", &source),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    assert!(matches!(outcome, TaskOutcome::Skipped(SkipReason::Encode)));
    let paths = TaskPaths::new(&task_dir, "clip", "medium");
    assert!(paths.encoding_log.exists(), "failed encode still leaves its log");
    assert_eq!(tools.decoder.calls.get(), 0);
    assert_eq!(tools.scorer.calls.get(), 0);
    Ok(())
}

#[test]
fn decode_failure_cleans_partial_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("clip.y4m");
    File::create(&source)?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    tools.decoder.fail.set(true);
    let outcome = run_task(
        &tools,
        &file_video("clip", &source),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    assert!(matches!(
        outcome,
        TaskOutcome::Skipped(SkipReason::PostProcess)
    ));
    let paths = TaskPaths::new(&task_dir, "clip", "medium");
    assert!(!paths.decoded.exists());
    assert_eq!(tools.scorer.calls.get(), 0);
    Ok(())
}

#[test]
fn measure_failure_still_leaves_durable_logs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let source = dir.path().join("clip.y4m");
    File::create(&source)?;
    let task_dir = dir.path().join("task");

    let tools = mock_toolchain();
    tools.scorer.fail.set(true);
    let outcome = run_task(
        &tools,
        &file_video("clip", &source),
        &descriptor(),
        &task_dir,
        &TaskOptions::default(),
    )?;

    assert!(matches!(outcome, TaskOutcome::Skipped(SkipReason::Measure)));
    let paths = TaskPaths::new(&task_dir, "clip", "medium");
    assert!(paths.encoding_log.exists());
    assert!(!paths.decoded.exists(), "decoded file is cleaned on this path too");
    Ok(())
}
