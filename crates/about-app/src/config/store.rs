//! Observable preference store
//!
//! [`ConfigStore`] is the capability the update manager consumes; the host can
//! supply its own. [`TomlConfigStore`] is the implementation used by the
//! binary: typed [`Settings`] persisted to `config.toml`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use about_core::prelude::*;

use super::types::Settings;
use crate::subscription::Subscription;

const CONFIG_FILENAME: &str = "config.toml";
const TEMP_FILENAME: &str = ".config.toml.tmp";

/// Callback receiving the current value of an observed key
pub type ConfigObserver = Box<dyn Fn(bool) + Send + Sync>;

/// Persisted boolean preferences with change observation.
pub trait ConfigStore: Send + Sync {
    /// Current value of `key`; unknown keys read as `false`
    fn get(&self, key: &str) -> bool;

    /// Persist a new value. Observers fire only if the value changed.
    fn set(&self, key: &str, value: bool) -> Result<()>;

    /// Call `observer` with the current value now, then on every change.
    fn observe(&self, key: &str, observer: ConfigObserver) -> Subscription;
}

struct Observer {
    id: u64,
    key: String,
    callback: Arc<dyn Fn(bool) + Send + Sync>,
}

struct Inner {
    settings: Settings,
    config_dir: Option<PathBuf>,
    next_id: u64,
    observers: Vec<Observer>,
}

/// [`ConfigStore`] backed by a typed [`Settings`] value and an optional
/// `config.toml` on disk.
#[derive(Clone)]
pub struct TomlConfigStore {
    inner: Arc<Mutex<Inner>>,
}

impl TomlConfigStore {
    /// Store that never touches disk
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_dir(settings, None)
    }

    /// Load `<config_dir>/config.toml`, falling back to defaults.
    ///
    /// The directory is created on first write, not here.
    pub fn open(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let settings = load_settings(&config_dir);
        Self::with_dir(settings, Some(config_dir))
    }

    fn with_dir(settings: Settings, config_dir: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                settings,
                config_dir,
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    /// Path of the backing file, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        self.lock()
            .config_dir
            .as_ref()
            .map(|dir| dir.join(CONFIG_FILENAME))
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigStore for TomlConfigStore {
    fn get(&self, key: &str) -> bool {
        self.lock().settings.get_bool(key).unwrap_or(false)
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let observers = {
            let mut inner = self.lock();
            let mut updated = inner.settings.clone();
            let slot = updated
                .bool_mut(key)
                .ok_or_else(|| Error::unknown_setting(key))?;
            if *slot == value {
                trace!("Setting {} unchanged ({})", key, value);
                return Ok(());
            }
            *slot = value;

            if let Some(dir) = inner.config_dir.as_deref() {
                save_settings(dir, &updated)
                    .with_context(|| format!("Failed to persist {} = {}", key, value))?;
            }
            inner.settings = updated;
            debug!("Setting {} = {}", key, value);

            inner
                .observers
                .iter()
                .filter(|o| o.key == key)
                .map(|o| o.callback.clone())
                .collect::<Vec<_>>()
        };

        for observer in observers {
            observer(value);
        }
        Ok(())
    }

    fn observe(&self, key: &str, observer: ConfigObserver) -> Subscription {
        let callback: Arc<dyn Fn(bool) + Send + Sync> = Arc::from(observer);
        let (id, current) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.observers.push(Observer {
                id,
                key: key.to_string(),
                callback: callback.clone(),
            });
            (id, inner.settings.get_bool(key).unwrap_or(false))
        };

        callback(current);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner.observers.retain(|o| o.id != id);
            }
        })
    }
}

impl fmt::Debug for TomlConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("TomlConfigStore")
            .field("settings", &inner.settings)
            .field("config_dir", &inner.config_dir)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

/// Default directory for config.toml (`~/.config/soldat-about`)
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("soldat-about"))
}

/// Load settings from `<config_dir>/config.toml`
///
/// A missing or unreadable file yields defaults.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Save settings to `<config_dir>/config.toml`
///
/// Creates the directory if needed. Writes a temp file and renames it over
/// the old one.
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    let temp_path = config_dir.join(TEMP_FILENAME);

    let header = "# Soldat About preferences\n\
                  # Edited from the About panel; safe to edit by hand\n\n";
    let content = toml::to_string_pretty(settings)?;

    std::fs::write(&temp_path, format!("{}{}", header, content))
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    debug!("Saved settings to {:?}", config_path);
    Ok(())
}
