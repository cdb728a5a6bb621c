//! Process supervisor - tracks the game client and keeps the memory reader in step
//!
//! Each tick:
//! 1. If a target is held and has exited, detach and release it.
//! 2. If no target is held, look for one. A new target triggers one binding export.
//! 3. Reconcile the attachment with the live memory-reading flag.
//!
//! State is published to readers once, at the end of the tick.

mod runner;
mod snapshot;

pub use runner::SupervisorHandle;
pub use snapshot::{SupervisorPhase, SupervisorSnapshot};

use crate::attach::{reconcile, AttachmentAction, AttachmentState, MemoryAttach};
use crate::bindings::BindingExport;
use crate::config::ConfigSource;
use crate::error::TickFailure;
use crate::process::{ProcessLocator, TargetProcessHandle};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Fixed polling cadence
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// What happened during one tick
#[derive(Debug, Default)]
pub struct TickReport {
    /// Target acquired this tick
    pub acquired: Option<TargetProcessHandle>,
    /// Target found to have exited this tick
    pub lost: Option<TargetProcessHandle>,
    /// Attach/detach calls issued, in order
    pub actions: Vec<AttachmentAction>,
    /// Bindings were exported successfully
    pub exported: bool,
    pub failures: Vec<TickFailure>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Supervisor {
    locator: ProcessLocator,
    memory: Box<dyn MemoryAttach>,
    exporter: Box<dyn BindingExport>,
    config: Arc<dyn ConfigSource>,
    interval: Duration,

    target: Option<TargetProcessHandle>,
    attachment: AttachmentState,
    acquired_at: Option<DateTime<Utc>>,
    ticks: u64,
    last_failure: Option<String>,
    stopped: bool,

    status: watch::Sender<SupervisorSnapshot>,
}

impl Supervisor {
    pub fn new(
        locator: ProcessLocator,
        memory: Box<dyn MemoryAttach>,
        exporter: Box<dyn BindingExport>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        let (status, _) = watch::channel(SupervisorSnapshot::default());
        Self {
            locator,
            memory,
            exporter,
            config,
            interval: TICK_INTERVAL,
            target: None,
            attachment: AttachmentState::Detached,
            acquired_at: None,
            ticks: 0,
            last_failure: None,
            stopped: false,
            status,
        }
    }

    /// Override the polling cadence
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receiver for snapshots published at tick boundaries
    pub fn subscribe(&self) -> watch::Receiver<SupervisorSnapshot> {
        self.status.subscribe()
    }

    pub fn target(&self) -> Option<&TargetProcessHandle> {
        self.target.as_ref()
    }

    pub fn attachment(&self) -> AttachmentState {
        self.attachment
    }

    pub fn phase(&self) -> SupervisorPhase {
        if self.stopped {
            SupervisorPhase::Stopped
        } else if self.target.is_some() {
            SupervisorPhase::Tracking
        } else {
            SupervisorPhase::Idle
        }
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        SupervisorSnapshot {
            phase: self.phase(),
            target: self.target.clone(),
            attachment: self.attachment,
            acquired_at: self.acquired_at,
            ticks: self.ticks,
            last_failure: self.last_failure.clone(),
        }
    }

    /// Run one tick. Failures are logged and reported, never propagated.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.ticks += 1;

        if self.target.is_some() {
            self.check_liveness(&mut report);
        }

        if self.target.is_none() {
            self.acquire(&mut report);
        }

        // The reader may have dropped its session on its own
        if self.attachment == AttachmentState::Attached && !self.memory.is_attached() {
            warn!("Memory reader lost its session, marking detached");
            self.attachment = AttachmentState::Detached;
        } else if self.attachment == AttachmentState::Detached && self.memory.is_attached() {
            warn!("Memory reader holds an untracked session, detaching");
            self.memory.detach();
        }

        let enabled = self.config.memory_reading_enabled();
        let (next, action) = reconcile(self.attachment, self.target.as_ref(), enabled);
        self.apply(next, action, &mut report);

        if let Some(failure) = report.failures.last() {
            self.last_failure = Some(failure.to_string());
        }
        self.publish();

        report
    }

    fn check_liveness(&mut self, report: &mut TickReport) {
        let Some(handle) = self.target.as_ref() else {
            return;
        };

        match self.locator.is_alive(handle) {
            Ok(true) => {}
            Ok(false) => {
                info!(pid = handle.pid, name = %handle.name, "Process invalidated: {}", handle);

                // Forced, whatever the recorded state, so a respawn found this tick starts clean
                report.actions.push(AttachmentAction::Detach);
                self.memory.detach();
                self.attachment = AttachmentState::Detached;

                report.lost = self.target.take();
                self.acquired_at = None;
            }
            Err(e) => {
                warn!(pid = handle.pid, error = %e, "Liveness check failed, keeping target");
                report.failures.push(e.into());
            }
        }
    }

    fn acquire(&mut self, report: &mut TickReport) {
        match self.locator.try_find_target() {
            Ok(Some(handle)) => {
                info!(
                    pid = handle.pid,
                    name = %handle.name,
                    variant = ?handle.variant,
                    "Process found: {}",
                    handle
                );
                self.target = Some(handle.clone());
                self.acquired_at = Some(Utc::now());
                report.acquired = Some(handle);

                // Export on acquisition whether or not memory reading is on.
                // A failed export does not undo the acquisition.
                match self.exporter.export_bindings() {
                    Ok(()) => report.exported = true,
                    Err(e) => {
                        warn!(error = %e, "Binding export failed");
                        report.failures.push(e.into());
                    }
                }
            }
            Ok(None) => debug!("No game client running"),
            Err(e) => {
                warn!(error = %e, "Process enumeration failed");
                report.failures.push(e.into());
            }
        }
    }

    fn apply(&mut self, next: AttachmentState, action: AttachmentAction, report: &mut TickReport) {
        match action {
            AttachmentAction::None => self.attachment = next,
            AttachmentAction::Attach => {
                let Some(handle) = self.target.as_ref() else {
                    self.attachment = AttachmentState::Detached;
                    return;
                };
                report.actions.push(AttachmentAction::Attach);
                let result = self.memory.attach(handle);
                match result {
                    Ok(()) => self.attachment = next,
                    Err(e) => {
                        // A reader can fail with its session half open; close it.
                        // Retried naturally on the next tick while the flag stays on.
                        warn!(error = %e, "Memory reader attach failed");
                        self.memory.detach();
                        self.attachment = AttachmentState::Detached;
                        report.failures.push(e.into());
                    }
                }
            }
            AttachmentAction::Detach => {
                report.actions.push(AttachmentAction::Detach);
                self.memory.detach();
                self.attachment = next;
            }
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.snapshot());
    }

    /// Detach unconditionally, release the target and publish a final snapshot.
    ///
    /// The recorded attachment state may be stale, so detach is always issued.
    pub fn shutdown(&mut self) {
        info!("Process watcher shutting down");
        self.memory.detach();
        self.attachment = AttachmentState::Detached;
        self.target = None;
        self.acquired_at = None;
        self.stopped = true;
        self.publish();
    }
}
