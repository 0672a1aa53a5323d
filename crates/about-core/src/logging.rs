//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

const LOG_ENV_VAR: &str = "SOLDAT_ABOUT_LOG";
const LOG_FILENAME: &str = "soldat-about.log";
const DEFAULT_FILTER: &str = "soldat_about=info,about_app=info,about_core=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/soldat-about/logs/`, never to stdout,
/// which belongs to the headless NDJSON stream.
/// Log level is controlled by the `SOLDAT_ABOUT_LOG` environment variable.
///
/// # Examples
/// ```bash
/// SOLDAT_ABOUT_LOG=debug soldat-about
/// SOLDAT_ABOUT_LOG=about_app=trace soldat-about
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILENAME);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Soldat About starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Platform data dir, or the working directory when there is none
fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("soldat-about")
        .join("logs")
}
