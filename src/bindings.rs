//! Binding export - hand the current input bindings to the game client

use crate::error::ExportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Physical input element (e.g. "cross", "dpad_left") to action name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingMap(BTreeMap<String, String>);

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, input: impl Into<String>, action: impl Into<String>) {
        self.0.insert(input.into(), action.into());
    }

    pub fn get(&self, input: &str) -> Option<&str> {
        self.0.get(input).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for BindingMap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Bindings shared with whoever edits them; the exporter only reads
pub type SharedBindings = Arc<RwLock<BindingMap>>;

/// Produces the interchange artifact the game client loads
pub trait BindingExport: Send {
    fn export_bindings(&mut self) -> Result<(), ExportError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BindingDocument {
    pub exported_at: DateTime<Utc>,
    pub bindings: BindingMap,
}

/// Writes the binding map as JSON
pub struct JsonBindingExporter {
    bindings: SharedBindings,
    path: PathBuf,
}

impl JsonBindingExporter {
    pub fn new(bindings: SharedBindings, path: impl Into<PathBuf>) -> Self {
        Self {
            bindings,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default export location: <data_dir>/gamewatch/bindings.json
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gamewatch")
            .join("bindings.json")
    }
}

fn write_err(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Write {
        path: path.to_path_buf(),
        source,
    }
}

impl BindingExport for JsonBindingExporter {
    fn export_bindings(&mut self) -> Result<(), ExportError> {
        let bindings = match self.bindings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let doc = BindingDocument {
            exported_at: Utc::now(),
            bindings,
        };
        let content = serde_json::to_string_pretty(&doc)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
            }
        }

        // Write beside the target then rename so the client never reads a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| write_err(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| write_err(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            count = doc.bindings.len(),
            "Bindings exported"
        );
        Ok(())
    }
}
