// vaf-cli/src/logging.rs
//
// Console and file logging setup. The console always receives log output;
// `vaf run` additionally chains a log file inside the run's results
// directory so each run carries its own record.

use std::path::Path;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS",
/// used for log file names.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Initializes the global logger. Must be called exactly once, before any
/// log output matters.
pub fn setup_logging(log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
