//! Hot reload of the config file

use super::{Config, LiveSettings};
use crate::bindings::SharedBindings;
use crate::error::ConfigError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Re-read `path` and push its values into the live settings.
///
/// On failure the previous values stay in effect.
pub fn reload(
    path: &Path,
    settings: &LiveSettings,
    bindings: Option<&SharedBindings>,
) -> Result<Config, ConfigError> {
    let config = Config::load_from(path)?;

    let previous = settings.set_memory_reading_enabled(config.memory_reading_enabled);
    if previous != config.memory_reading_enabled {
        tracing::info!(
            enabled = config.memory_reading_enabled,
            "Memory reading setting changed"
        );
    }

    if let Some(shared) = bindings {
        match shared.write() {
            Ok(mut guard) => *guard = config.bindings.clone(),
            Err(poisoned) => *poisoned.into_inner() = config.bindings.clone(),
        }
    }

    Ok(config)
}

fn is_relevant(event: &Event, file_name: &std::ffi::OsStr) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
}

/// Watches the config file's directory; editors often replace the file instead
/// of writing it in place, which a watch on the file itself would miss.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn spawn(
        path: &Path,
        settings: LiveSettings,
        bindings: Option<SharedBindings>,
    ) -> Result<Self, ConfigError> {
        let watch_err = |source: notify::Error| ConfigError::Watch {
            path: path.to_path_buf(),
            source,
        };

        let path = std::fs::canonicalize(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();

        let target = path.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &file_name) => {
                    if let Err(e) = reload(&target, &settings, bindings.as_ref()) {
                        tracing::warn!(error = %e, "Config reload failed, keeping previous settings");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            })
            .map_err(watch_err)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_err)?;

        tracing::debug!(path = %path.display(), "Watching config file");

        Ok(Self {
            path,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
