//! Probe scheduling.
//!
//! Owns at most one background task per balancer. The periodic loop sleeps
//! for the poll interval, runs a probe pass, and only then arms the next
//! sleep, so passes never overlap and the next tick is always scheduled
//! from pass completion. Shutdown is a broadcast signal plus an abort of
//! the retained handle; a pass already in flight finishes (or times out) on
//! its own and its writes land in a registry nobody schedules against.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};

use super::{probe::StatusProbe, registry::EndpointRegistry};

pub(crate) struct Scheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { handle: Mutex::new(None), shutdown_tx }
    }

    /// Installs the periodic probe loop.
    ///
    /// Replaces (and aborts) any previously installed handle, keeping the
    /// at-most-one-pending-handle invariant unconditional.
    pub(crate) fn start(
        &self,
        interval: Duration,
        probe: Arc<StatusProbe>,
        registry: Arc<EndpointRegistry>,
    ) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {
                        if let Err(e) = probe.run_pass(&registry).await {
                            tracing::error!(error = %e, "status probe pass failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("probe scheduler shutting down");
                        break;
                    }
                }
            }
        });

        let mut guard = self.handle.lock();
        if let Some(previous) = guard.replace(task) {
            previous.abort();
        }
    }

    /// Cancels the pending loop. Idempotent; safe to call without `start`.
    pub(crate) fn stop(&self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// Whether a probe loop is currently installed and alive.
    pub(crate) fn is_running(&self) -> bool {
        self.handle.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}
