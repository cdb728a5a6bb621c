//! Scripted collaborators shared by the integration tests
#![allow(dead_code)]

use gamewatch::error::{AttachError, ExportError, QueryError};
use gamewatch::process::{KnownTargetNames, ProcessEntry, ProcessLocator, ProcessTable};
use gamewatch::{BindingExport, LiveSettings, MemoryAttach, Supervisor, TargetProcessHandle};
use std::sync::{Arc, Mutex};

/// Every collaborator call, in the order the supervisor issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Attach(u32),
    Detach,
    Export,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

pub fn count(log: &CallLog, call: &Call) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| match (c, call) {
            (Call::Attach(_), Call::Attach(_)) => true,
            (a, b) => *a == b,
        })
        .count()
}

#[derive(Default)]
struct TableState {
    processes: Vec<ProcessEntry>,
    failing_snapshots: u32,
    failing_liveness: bool,
}

/// In-memory process table the test mutates between ticks
#[derive(Clone, Default)]
pub struct ScriptedTable {
    state: Arc<Mutex<TableState>>,
}

impl ScriptedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, pid: u32, name: &str) {
        self.state.lock().unwrap().processes.push(ProcessEntry {
            pid,
            name: name.to_string(),
            start_time: 1_000 + pid as u64,
            alive: true,
        });
    }

    /// Add an entry that is already exiting (zombie)
    pub fn spawn_exiting(&self, pid: u32, name: &str) {
        self.state.lock().unwrap().processes.push(ProcessEntry {
            pid,
            name: name.to_string(),
            start_time: 1_000 + pid as u64,
            alive: false,
        });
    }

    pub fn kill(&self, pid: u32) {
        self.state.lock().unwrap().processes.retain(|p| p.pid != pid);
    }

    pub fn fail_snapshots(&self, n: u32) {
        self.state.lock().unwrap().failing_snapshots = n;
    }

    pub fn fail_liveness(&self, failing: bool) {
        self.state.lock().unwrap().failing_liveness = failing;
    }
}

impl ProcessTable for ScriptedTable {
    fn snapshot(&mut self) -> Result<Vec<ProcessEntry>, QueryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_snapshots > 0 {
            state.failing_snapshots -= 1;
            return Err(QueryError::Enumeration("scripted failure".to_string()));
        }
        Ok(state.processes.clone())
    }

    fn is_alive(&mut self, handle: &TargetProcessHandle) -> Result<bool, QueryError> {
        let state = self.state.lock().unwrap();
        if state.failing_liveness {
            return Err(QueryError::Enumeration("scripted liveness failure".to_string()));
        }
        Ok(state
            .processes
            .iter()
            .any(|p| p.pid == handle.pid && p.start_time == handle.start_time && p.alive))
    }
}

#[derive(Default)]
struct MemoryState {
    attached: Option<u32>,
    failing_attaches: u32,
    half_open_failures: bool,
}

/// Memory reader that records calls and can be told to fail
#[derive(Clone)]
pub struct RecordingMemory {
    log: CallLog,
    state: Arc<Mutex<MemoryState>>,
}

impl RecordingMemory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Arc::default(),
        }
    }

    pub fn fail_attaches(&self, n: u32) {
        self.state.lock().unwrap().failing_attaches = n;
    }

    /// Failing attaches leave the session open before returning the error
    pub fn fail_attaches_half_open(&self, n: u32) {
        let mut state = self.state.lock().unwrap();
        state.failing_attaches = n;
        state.half_open_failures = true;
    }

    /// Simulate the reader losing its session behind the supervisor's back
    pub fn drop_session(&self) {
        self.state.lock().unwrap().attached = None;
    }

    pub fn attached_pid(&self) -> Option<u32> {
        self.state.lock().unwrap().attached
    }
}

impl MemoryAttach for RecordingMemory {
    fn attach(&mut self, handle: &TargetProcessHandle) -> Result<(), AttachError> {
        self.log.lock().unwrap().push(Call::Attach(handle.pid));
        let mut state = self.state.lock().unwrap();
        if state.failing_attaches > 0 {
            state.failing_attaches -= 1;
            if state.half_open_failures {
                state.attached = Some(handle.pid);
                return Err(AttachError::Other {
                    pid: handle.pid,
                    reason: "scripted failure after open".to_string(),
                });
            }
            return Err(AttachError::PermissionDenied { pid: handle.pid });
        }
        state.attached = Some(handle.pid);
        Ok(())
    }

    fn detach(&mut self) {
        self.log.lock().unwrap().push(Call::Detach);
        self.state.lock().unwrap().attached = None;
    }

    fn is_attached(&self) -> bool {
        self.state.lock().unwrap().attached.is_some()
    }
}

/// Exporter that records calls and can be told to fail
#[derive(Clone)]
pub struct RecordingExporter {
    log: CallLog,
    failing: Arc<Mutex<bool>>,
}

impl RecordingExporter {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failing: Arc::default(),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl BindingExport for RecordingExporter {
    fn export_bindings(&mut self) -> Result<(), ExportError> {
        self.log.lock().unwrap().push(Call::Export);
        if *self.failing.lock().unwrap() {
            return Err(ExportError::Other("scripted export failure".to_string()));
        }
        Ok(())
    }
}

/// A supervisor wired to scripted collaborators, plus the handles to drive them
pub struct Harness {
    pub supervisor: Supervisor,
    pub table: ScriptedTable,
    pub memory: RecordingMemory,
    pub exporter: RecordingExporter,
    pub settings: LiveSettings,
    pub log: CallLog,
}

impl Harness {
    pub fn new(memory_reading_enabled: bool) -> Self {
        let log: CallLog = Arc::default();
        let table = ScriptedTable::new();
        let memory = RecordingMemory::new(log.clone());
        let exporter = RecordingExporter::new(log.clone());
        let settings = LiveSettings::new(memory_reading_enabled);

        let locator = ProcessLocator::new(KnownTargetNames::default(), Box::new(table.clone()));
        let supervisor = Supervisor::new(
            locator,
            Box::new(memory.clone()),
            Box::new(exporter.clone()),
            Arc::new(settings.clone()),
        );

        Self {
            supervisor,
            table,
            memory,
            exporter,
            settings,
            log,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        calls(&self.log)
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }
}
