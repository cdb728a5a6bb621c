//! Memory session backed by the target's memory file

use super::MemoryAttach;
use crate::error::AttachError;
use crate::process::TargetProcessHandle;
use std::fs::File;

/// An open read session on the target's address space
struct Session {
    pid: u32,
    _mem: File,
}

/// Holds at most one open memory session. Reading and parsing happen elsewhere;
/// this only owns the session lifetime.
#[derive(Default)]
pub struct ProcMemAttacher {
    session: Option<Session>,
}

impl ProcMemAttacher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached_pid(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.pid)
    }
}

#[cfg(target_os = "linux")]
fn open_memory(pid: u32) -> Result<File, AttachError> {
    use std::io::ErrorKind;

    File::open(format!("/proc/{pid}/mem")).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => AttachError::PermissionDenied { pid },
        ErrorKind::NotFound => AttachError::ProcessGone { pid },
        _ => AttachError::Other {
            pid,
            reason: e.to_string(),
        },
    })
}

#[cfg(not(target_os = "linux"))]
fn open_memory(_pid: u32) -> Result<File, AttachError> {
    Err(AttachError::Unsupported)
}

impl MemoryAttach for ProcMemAttacher {
    fn attach(&mut self, handle: &TargetProcessHandle) -> Result<(), AttachError> {
        if self.attached_pid() == Some(handle.pid) {
            return Ok(());
        }

        // Only one session system-wide
        self.detach();

        let mem = open_memory(handle.pid)?;
        tracing::info!(pid = handle.pid, name = %handle.name, "Memory reader attached");
        self.session = Some(Session {
            pid: handle.pid,
            _mem: mem,
        });
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(pid = session.pid, "Memory reader detached");
        }
    }

    fn is_attached(&self) -> bool {
        self.session.is_some()
    }
}
