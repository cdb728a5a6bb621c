//! Background task that drives the supervisor on a fixed interval

use super::{Supervisor, SupervisorSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

impl Supervisor {
    /// Tick until a shutdown is requested, then detach and publish `Stopped`.
    ///
    /// Shutdown is checked between ticks only; a tick in progress always completes.
    /// Dropping the sender counts as a shutdown request.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Process watcher starting up");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let report = self.tick();
                    for failure in &report.failures {
                        tracing::debug!(error = %failure, "Tick completed with failure");
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Move the supervisor onto a tokio task
    pub fn spawn(self) -> SupervisorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = self.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));

        SupervisorHandle {
            shutdown: shutdown_tx,
            status,
            task,
        }
    }
}

/// Foreground side of a running supervisor: read snapshots, request shutdown
pub struct SupervisorHandle {
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<SupervisorSnapshot>,
    task: JoinHandle<()>,
}

impl SupervisorHandle {
    /// Latest published snapshot
    pub fn snapshot(&self) -> SupervisorSnapshot {
        self.status.borrow().clone()
    }

    /// A receiver that can await state changes
    pub fn status(&self) -> watch::Receiver<SupervisorSnapshot> {
        self.status.clone()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request shutdown and wait for the final detach
    pub async fn shutdown(self) -> Result<SupervisorSnapshot, tokio::task::JoinError> {
        self.request_shutdown();
        self.task.await?;
        Ok(self.status.borrow().clone())
    }
}
