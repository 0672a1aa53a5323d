//! Configuration for the About panel
//!
//! Supports:
//! - `~/.config/soldat-about/config.toml` - Persisted preferences
//! - In-memory stores for hosts that persist preferences themselves

pub mod store;
pub mod types;

pub use store::{
    default_config_dir, load_settings, save_settings, ConfigObserver, ConfigStore,
    TomlConfigStore,
};
pub use types::*;
