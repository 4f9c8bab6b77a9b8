mod logging;
mod settings;

use clap::{CommandFactory, Parser};
use gpx_merge_lib::Merger;
use settings::Settings;
use std::process::ExitCode;

/// Pipeline failure: no inputs, unwritable output
const EXIT_PIPELINE_ERROR: u8 = 1;
/// Conflicting or invalid arguments
const EXIT_ARGUMENT_ERROR: u8 = 2;

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        if let Err(e) = Settings::command().print_help() {
            eprintln!("{e}");
            return ExitCode::from(EXIT_PIPELINE_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    let settings = match Settings::try_parse() {
        Ok(settings) => settings,
        Err(e) => e.exit(),
    };

    if let Err(e) = logging::setup_logging(settings.log_file.as_deref()) {
        tracing::error!("Failed to create log file: {e}");
        return ExitCode::from(EXIT_ARGUMENT_ERROR);
    }

    let config = match settings.merge_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(EXIT_ARGUMENT_ERROR);
        }
    };

    profiling::scope!("gpx-merger::run");
    let merger = Merger::new(config);
    match merger.run(&settings.input_files) {
        Ok(outcome) => {
            if !outcome.skipped.is_empty() {
                tracing::warn!(
                    "Skipped {} of {} input files",
                    outcome.skipped.len(),
                    settings.input_files.len()
                );
            }
            tracing::info!(
                "Wrote {} tracks, {} segments, {} points to {}",
                outcome.tracks,
                outcome.segments,
                outcome.points,
                outcome.target.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(EXIT_PIPELINE_ERROR)
        }
    }
}
