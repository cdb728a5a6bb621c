//! Target discovery - find the game client in the OS process table

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use sysinfo::{Pid, ProcessStatus, System};

/// Executable names accepted as the game client, without extension
pub const DEFAULT_TARGET_NAMES: &[&str] = &["wow", "wow-64", "wowt", "wowt-64", "wowb", "wowb-64"];

/// Which build of the client a target name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetVariant {
    Retail32,
    Retail64,
    Ptr32,
    Ptr64,
    Beta32,
    Beta64,
    Other,
}

impl TargetVariant {
    /// Classify a normalized process name
    pub fn from_name(name: &str) -> Self {
        match name {
            "wow" => TargetVariant::Retail32,
            "wow-64" => TargetVariant::Retail64,
            "wowt" => TargetVariant::Ptr32,
            "wowt-64" => TargetVariant::Ptr64,
            "wowb" => TargetVariant::Beta32,
            "wowb-64" => TargetVariant::Beta64,
            _ => TargetVariant::Other,
        }
    }

    pub fn is_64_bit(&self) -> bool {
        matches!(
            self,
            TargetVariant::Retail64 | TargetVariant::Ptr64 | TargetVariant::Beta64
        )
    }
}

/// Lowercase a process name and drop a trailing `.exe`
pub fn normalize_process_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Fixed set of accepted process names, matched case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownTargetNames {
    names: Vec<String>,
}

impl KnownTargetNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| normalize_process_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn contains(&self, process_name: &str) -> bool {
        let normalized = normalize_process_name(process_name);
        self.names.iter().any(|n| *n == normalized)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for KnownTargetNames {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_NAMES.iter().copied())
    }
}

/// One row of a process table snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Seconds since the epoch, used to tell a reused PID from the original process
    pub start_time: u64,
    pub alive: bool,
}

/// The process currently identified as the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProcessHandle {
    pub pid: u32,
    pub name: String,
    pub start_time: u64,
    pub variant: TargetVariant,
}

impl TargetProcessHandle {
    pub fn from_entry(entry: &ProcessEntry) -> Self {
        let variant = TargetVariant::from_name(&normalize_process_name(&entry.name));
        Self {
            pid: entry.pid,
            name: entry.name.clone(),
            start_time: entry.start_time,
            variant,
        }
    }
}

impl fmt::Display for TargetProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.pid, self.name)
    }
}

/// Read access to the OS process table
pub trait ProcessTable: Send {
    /// Enumerate all processes in a stable order
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, QueryError>;

    /// Whether the process behind `handle` is still the same live process
    fn is_alive(&mut self, handle: &TargetProcessHandle) -> Result<bool, QueryError>;
}

/// Process table backed by `sysinfo`
pub struct SystemProcessTable {
    sys: System,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

fn status_is_live(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, QueryError> {
        self.sys.refresh_processes();

        let mut entries: Vec<ProcessEntry> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, proc)| ProcessEntry {
                pid: pid.as_u32(),
                name: proc.name().to_string(),
                start_time: proc.start_time(),
                alive: status_is_live(proc.status()),
            })
            .collect();

        // A readable process table always contains at least this process
        if entries.is_empty() {
            return Err(QueryError::EmptyProcessTable);
        }

        // HashMap order is arbitrary; PID order keeps the tie-break deterministic.
        // On Linux sysinfo also lists threads, which carry their process's name;
        // a thread id is always above its thread-group leader's pid, so the
        // leader sorts first and is the one matched.
        entries.sort_by_key(|e| e.pid);
        Ok(entries)
    }

    fn is_alive(&mut self, handle: &TargetProcessHandle) -> Result<bool, QueryError> {
        let pid = Pid::from_u32(handle.pid);
        if !self.sys.refresh_process(pid) {
            return Ok(false);
        }

        Ok(self
            .sys
            .process(pid)
            .map(|p| p.start_time() == handle.start_time && status_is_live(p.status()))
            .unwrap_or(false))
    }
}

/// Finds the first live process whose name is a known target name
pub struct ProcessLocator {
    names: KnownTargetNames,
    table: Box<dyn ProcessTable>,
}

impl ProcessLocator {
    pub fn new(names: KnownTargetNames, table: Box<dyn ProcessTable>) -> Self {
        Self { names, table }
    }

    /// Locator over the real process table with the default client names
    pub fn system() -> Self {
        Self::new(KnownTargetNames::default(), Box::new(SystemProcessTable::new()))
    }

    pub fn names(&self) -> &KnownTargetNames {
        &self.names
    }

    /// Enumerate once and return the first match in table order
    pub fn try_find_target(&mut self) -> Result<Option<TargetProcessHandle>, QueryError> {
        let entries = self.table.snapshot()?;
        Ok(entries
            .iter()
            .find(|e| e.alive && self.names.contains(&e.name))
            .map(TargetProcessHandle::from_entry))
    }

    /// Like [`try_find_target`](Self::try_find_target), but a failed query is just "no match"
    pub fn find_target(&mut self) -> Option<TargetProcessHandle> {
        match self.try_find_target() {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(error = %e, "Process enumeration failed");
                None
            }
        }
    }

    pub fn is_alive(&mut self, handle: &TargetProcessHandle) -> Result<bool, QueryError> {
        self.table.is_alive(handle)
    }
}
