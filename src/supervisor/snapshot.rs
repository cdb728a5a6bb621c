//! Read-only view of supervisor state published at tick boundaries

use crate::attach::AttachmentState;
use crate::process::TargetProcessHandle;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SupervisorPhase {
    /// No target held
    #[default]
    Idle,
    /// Target held, attachment follows the live flag
    Tracking,
    /// Shut down; the memory reader has been detached
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupervisorSnapshot {
    pub phase: SupervisorPhase,
    pub target: Option<TargetProcessHandle>,
    pub attachment: AttachmentState,
    pub acquired_at: Option<DateTime<Utc>>,
    pub ticks: u64,
    pub last_failure: Option<String>,
}

impl SupervisorSnapshot {
    pub fn is_target_running(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment == AttachmentState::Attached
    }

    /// One-line status for the foreground display
    pub fn summary(&self) -> String {
        let target = match &self.target {
            Some(t) => format!("{t} ({:?})", t.variant),
            None => "no game client".to_string(),
        };
        let memory = if self.is_attached() {
            "attached"
        } else {
            "detached"
        };
        format!("{:?}: {target}, memory reader {memory}", self.phase)
    }

    /// Same observable state, ignoring tick count and failure text
    pub fn same_state(&self, other: &SupervisorSnapshot) -> bool {
        self.phase == other.phase
            && self.target == other.target
            && self.attachment == other.attachment
    }
}
