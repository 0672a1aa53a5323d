//! Soldat About - update status bridge for the About panel
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use about_core::prelude::*;
use clap::Parser;
use soldat_about::HeadlessOptions;

/// Soldat About - update status bridge for the About panel
#[derive(Parser, Debug)]
#[command(name = "soldat-about")]
#[command(about = "Tracks Soldat update status over stdin/stdout", long_about = None)]
struct Args {
    /// Directory holding config.toml
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// Version of the running application
    #[arg(long, value_name = "VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    current_version: String,

    /// Behave as if this platform cannot self-update
    #[arg(long)]
    unsupported: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    soldat_about::run(HeadlessOptions {
        config_dir: args.config_dir,
        current_version: args.current_version,
        unsupported: args.unsupported,
    })
    .await
}
