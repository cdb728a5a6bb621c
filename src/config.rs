//! Configuration file and the live settings the supervisor reads every tick

pub mod watcher;

use crate::bindings::{BindingMap, JsonBindingExporter};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use watcher::ConfigWatcher;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attach the memory reader while the game client runs
    pub memory_reading_enabled: bool,
    /// Where exported bindings are written
    pub export_path: Option<PathBuf>,
    /// Physical input to action name
    pub bindings: BindingMap,
}

impl Config {
    /// Candidate config files, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("gamewatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".gamewatch.toml")),
            Some(PathBuf::from("gamewatch.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load the first readable config from the search paths, falling back to defaults.
    /// Returns the path the config came from, if any.
    pub fn load() -> (Self, Option<PathBuf>) {
        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return (config, Some(path)),
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable config"),
            }
        }

        (Config::default(), None)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_path
            .clone()
            .unwrap_or_else(JsonBindingExporter::default_path)
    }
}

/// Source of the memory-reading toggle, read fresh every tick
pub trait ConfigSource: Send + Sync {
    fn memory_reading_enabled(&self) -> bool;
}

/// Live settings shared between the config watcher, the UI and the supervisor
#[derive(Debug, Clone, Default)]
pub struct LiveSettings {
    memory_reading_enabled: Arc<AtomicBool>,
}

impl LiveSettings {
    pub fn new(memory_reading_enabled: bool) -> Self {
        Self {
            memory_reading_enabled: Arc::new(AtomicBool::new(memory_reading_enabled)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.memory_reading_enabled)
    }

    /// Returns the previous value
    pub fn set_memory_reading_enabled(&self, enabled: bool) -> bool {
        self.memory_reading_enabled.swap(enabled, Ordering::SeqCst)
    }
}

impl ConfigSource for LiveSettings {
    fn memory_reading_enabled(&self) -> bool {
        self.memory_reading_enabled.load(Ordering::SeqCst)
    }
}
