//! Logging setup for the command line tool
//!
//! Events are filtered by `RUST_LOG` when set, otherwise by a build-dependent default.
//! An optional log file receives the same events without ANSI colors.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is not set
pub fn default_directives() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives()))
}

/// Install the global subscriber
///
/// Fails only when the log file cannot be created; console logging is installed first so the
/// failure itself can be reported.
pub fn setup_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_filter(env_filter());

    let file = match log_file {
        Some(path) => match File::create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                let _ = tracing_subscriber::registry().with(console_layer).try_init();
                return Err(e);
            }
        },
        None => None,
    };

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(env_filter())
    });

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::debug!(
        "Logging initialized (default filter: {}, RUST_LOG overrides)",
        default_directives()
    );
    Ok(())
}
