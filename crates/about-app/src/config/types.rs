//! Configuration types

use serde::{Deserialize, Serialize};

/// Key of the "install updates automatically" preference
pub const AUTO_UPDATE_KEY: &str = "core.automaticallyUpdate";

/// Persisted preferences (config.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub core: CoreSettings,
}

/// Core application settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CoreSettings {
    /// Check for and download updates in the background
    #[serde(default = "default_true")]
    pub automatically_update: bool,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            automatically_update: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Read a boolean setting by its dotted key
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            AUTO_UPDATE_KEY => Some(self.core.automatically_update),
            _ => None,
        }
    }

    /// Mutable access to a boolean setting by its dotted key
    pub(crate) fn bool_mut(&mut self, key: &str) -> Option<&mut bool> {
        match key {
            AUTO_UPDATE_KEY => Some(&mut self.core.automatically_update),
            _ => None,
        }
    }
}
