//! Error types for every failure a supervisor tick can observe

use std::path::PathBuf;
use thiserror::Error;

/// Querying the OS process table or window metrics failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("process table enumeration returned no entries")]
    EmptyProcessTable,

    #[error("process table query failed: {0}")]
    Enumeration(String),

    #[error("window query for pid {pid} failed: {reason}")]
    Window { pid: u32, reason: String },
}

/// Attaching the memory reader to a live process failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("permission denied attaching to pid {pid}")]
    PermissionDenied { pid: u32 },

    #[error("process {pid} exited before the attach completed")]
    ProcessGone { pid: u32 },

    #[error("memory attachment is not supported on this platform")]
    Unsupported,

    #[error("attach to pid {pid} failed: {reason}")]
    Other { pid: u32, reason: String },
}

/// Writing the binding interchange file failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize bindings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write bindings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("binding export failed: {0}")]
    Other(String),
}

/// Loading or watching the configuration file failed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to watch config {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A failure contained within a single supervisor tick
#[derive(Debug, Error)]
pub enum TickFailure {
    #[error("transient query failure: {0}")]
    TransientQuery(#[from] QueryError),

    #[error("attach failure: {0}")]
    Attach(#[from] AttachError),

    #[error("export failure: {0}")]
    Export(#[from] ExportError),
}

impl TickFailure {
    pub fn is_transient_query(&self) -> bool {
        matches!(self, TickFailure::TransientQuery(_))
    }

    pub fn is_attach(&self) -> bool {
        matches!(self, TickFailure::Attach(_))
    }

    pub fn is_export(&self) -> bool {
        matches!(self, TickFailure::Export(_))
    }
}
