//! Soldat About Library
//!
//! Hosts the update status machine behind an NDJSON stdio bridge so a host
//! process can drive it and render what it reports.

pub mod headless;

// Re-export main entry points
pub use headless::runner::{run_headless, run_session, HeadlessOptions};

use about_core::prelude::*;

/// Application entry point: error reports, file logging, then the bridge
pub async fn run(options: HeadlessOptions) -> Result<()> {
    // Initialize error handling
    color_eyre::install().map_err(|e| Error::startup(e.to_string()))?;

    // Initialize logging (to file, since stdout carries the NDJSON stream)
    about_core::logging::init()?;

    let result = run_headless(options).await;

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    result
}
