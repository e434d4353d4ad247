//! Input latency monitor.
//!
//! Times the gap between a pointer-down on the board and the board's next
//! visible DOM change (the piece being picked up or moved).

use std::sync::Arc;
use std::time::Duration;

use chesskit_protocols::{DomPort, MutationKind, MutationRecord, NodeId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::types::SampleCallback;

/// Board element interactions are measured on.
pub const BOARD_SELECTOR: &str = "wc-chess-board";

/// Pending interactions older than this are dropped.
pub const INPUT_TIMEOUT: Duration = Duration::from_secs(2);

const WATCHED_ATTRIBUTES: [&str; 3] = ["class", "style", "transform"];

#[derive(Debug, Clone, Copy)]
struct Pending {
    board: NodeId,
    at: Instant,
}

pub struct InputMonitor {
    dom: Arc<dyn DomPort>,
    timeout: Duration,
    pending: Arc<Mutex<Option<Pending>>>,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl InputMonitor {
    pub fn new(dom: Arc<dyn DomPort>, timeout: Duration) -> Self {
        Self {
            dom,
            timeout,
            pending: Arc::new(Mutex::new(None)),
            running: Mutex::new(None),
        }
    }

    pub fn start(&self, callback: SampleCallback) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let mut records = self.dom.observe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let dom = self.dom.clone();
        let pending = self.pending.clone();
        let timeout = self.timeout;
        let task = tokio::spawn(async move {
            loop {
                let record = tokio::select! {
                    _ = token.cancelled() => break,
                    record = records.recv() => record,
                };
                let Some(record) = record else { break };

                let mut slot = pending.lock();
                let Some(interaction) = *slot else { continue };
                if interaction.at.elapsed() > timeout {
                    trace!("Input interaction expired");
                    *slot = None;
                    continue;
                }
                if !is_board_response(&*dom, interaction.board, &record) {
                    continue;
                }
                *slot = None;
                drop(slot);

                let ms = (interaction.at.elapsed().as_secs_f64() * 1000.0).round();
                callback(ms);
            }
        });
        *running = Some((cancel, task));
    }

    /// A pointer went down on `target`. Returns whether it starts a
    /// measurement (running, and the target is on the board).
    pub fn pointer_down(&self, target: NodeId) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(board) = self.dom.query(BOARD_SELECTOR) else {
            return false;
        };
        if target != board && !self.dom.contains(board, target) {
            return false;
        }
        *self.pending.lock() = Some(Pending {
            board,
            at: Instant::now(),
        });
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .is_some_and(|p| p.at.elapsed() <= self.timeout)
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn stop(&self) {
        if let Some((cancel, task)) = self.running.lock().take() {
            cancel.cancel();
            task.abort();
        }
        *self.pending.lock() = None;
    }
}

impl Drop for InputMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_board_response(dom: &dyn DomPort, board: NodeId, record: &MutationRecord) -> bool {
    let relevant = match &record.kind {
        MutationKind::ChildList { .. } => true,
        MutationKind::Attributes { name } => WATCHED_ATTRIBUTES.contains(&name.as_str()),
        MutationKind::CharacterData => false,
    };
    relevant && (record.target == board || dom.contains(board, record.target))
}
