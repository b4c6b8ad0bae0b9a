//! Logging infrastructure for tripfolio.
//!
//! Uses the `tracing` crate with file-based output. Logs go to the platform
//! cache directory (`~/.cache/tripfolio/tripfolio.log` on Linux).
//! Configure verbosity via `TRIPFOLIO_LOG` environment variable (default: `info`).
//!
//! # Example
//!
//! ```bash
//! # Normal operation (info level)
//! tripfolio serve
//!
//! # See why a photo came out without metadata
//! TRIPFOLIO_LOG=tripfolio::metadata=debug tripfolio exif IMG_0042.jpg
//!
//! # Follow the server log
//! tail -f ~/.cache/tripfolio/tripfolio.log
//! ```

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::{self, format::FmtSpan}, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "TRIPFOLIO_LOG";

/// Initialize the logging system.
///
/// Creates the log directory if needed and sets up file-based logging.
/// When TRIPFOLIO_LOG is set, also logs to stderr for immediate feedback.
/// Returns a guard that must be held for the duration of the program.
/// When the guard is dropped, any remaining logs are flushed.
pub fn init_logging() -> Result<WorkerGuard> {
    let cache_dir = directories::ProjectDirs::from("", "", "tripfolio")
        .context("Failed to determine cache directory")?
        .cache_dir()
        .to_path_buf();

    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

    let log_file = cache_dir.join("tripfolio.log");

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    // Non-blocking writer keeps request handlers off disk I/O
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let log_env = std::env::var(LOG_ENV).ok();
    let verbose = log_env.is_some();
    let filter_str = log_env.unwrap_or_else(|| "info,tower_http=info".to_string());

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::CLOSE);

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(&filter_str))
        .with(file_layer)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")?;

    Ok(guard)
}

