//! Mutation watchdog.
//!
//! The host page occasionally rebuilds its layout and puts the player cards
//! back under the board. The watchdog watches the document and re-applies the
//! transform when that happens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::engine::{ApplyOutcome, LayoutEngine};

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Re-applies the layout after the host resets it.
pub struct MutationWatchdog {
    engine: Arc<LayoutEngine>,
    running: Mutex<Option<Running>>,
    reapply_count: Arc<AtomicU64>,
}

impl MutationWatchdog {
    pub fn new(engine: Arc<LayoutEngine>) -> Self {
        Self {
            engine,
            running: Mutex::new(None),
            reapply_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start observing. Replaces any previous subscription.
    pub fn start(&self, config: LayoutConfig) {
        self.stop();

        let mut records = self.engine.dom().observe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let engine = self.engine.clone();
        let reapply_count = self.reapply_count.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    record = records.recv() => {
                        if record.is_none() {
                            debug!("Document observer closed");
                            break;
                        }
                        let mut batch = 1usize;
                        while records.try_recv().is_ok() {
                            batch += 1;
                        }

                        if engine.marker_present() || !engine.cards_in_original_location() {
                            continue;
                        }
                        info!(batch, "Host page reset the layout, re-applying");

                        let result = tokio::select! {
                            _ = token.cancelled() => break,
                            result = engine.apply(&config) => result,
                        };
                        match result {
                            Ok(ApplyOutcome::Applied) => {
                                reapply_count.fetch_add(1, Ordering::SeqCst);
                            }
                            Ok(outcome) => debug!(?outcome, "Re-apply skipped"),
                            Err(e) => warn!(error = %e, "Re-apply failed"),
                        }
                    }
                }
            }
            debug!("Mutation watchdog stopped");
        });

        *self.running.lock() = Some(Running { cancel, task });
        debug!("Mutation watchdog started");
    }

    /// Stop observing. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            running.task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Number of successful re-applications since creation.
    pub fn reapply_count(&self) -> u64 {
        self.reapply_count.load(Ordering::SeqCst)
    }
}

impl Drop for MutationWatchdog {
    fn drop(&mut self) {
        self.stop();
    }
}
