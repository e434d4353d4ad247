//! Data readiness detection.
//!
//! The host fills in player cards asynchronously and in no fixed order, and
//! some data never arrives (anonymous players have no rating). A card is
//! considered ready once a quorum of independent signals is true; waiting
//! gives up after a timeout and proceeds with whatever is there.

use std::time::Duration;

use chesskit_protocols::{DomPort, FrameClock, NodeId};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::selectors;

pub const DEFAULT_MIN_SIGNALS: usize = 3;
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Independent "data has arrived" signals for one player card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSignals {
    pub username: bool,
    pub avatar: bool,
    pub rating: bool,
    pub clock: bool,
    pub captured_pieces: bool,
}

impl DataSignals {
    pub fn count(&self) -> usize {
        [
            self.username,
            self.avatar,
            self.rating,
            self.clock,
            self.captured_pieces,
        ]
        .into_iter()
        .filter(|&s| s)
        .count()
    }
}

fn has_text(dom: &dyn DomPort, root: NodeId, selector: &str) -> bool {
    dom.query_within(root, selector)
        .is_some_and(|node| !dom.text_content(node).trim().is_empty())
}

/// Evaluate every signal under `root`.
pub fn check_signals(dom: &dyn DomPort, root: NodeId) -> DataSignals {
    DataSignals {
        username: selectors::USERNAME.iter().any(|s| has_text(dom, root, s)),
        avatar: dom
            .query_within(root, selectors::AVATAR_IMAGE)
            .is_some_and(|img| dom.image_loaded(img)),
        rating: selectors::RATING.iter().any(|s| has_text(dom, root, s)),
        clock: dom.query_within(root, selectors::CLOCK).is_some(),
        captured_pieces: dom.query_within(root, selectors::CAPTURED_PIECES).is_some(),
    }
}

/// Quorum check.
pub fn is_ready(signals: &DataSignals, min_signals: usize) -> bool {
    signals.count() >= min_signals
}

/// Check now, then once per frame, until the quorum is met or `timeout` has
/// elapsed. Never fails: on timeout the partial signals are returned.
pub async fn wait_for_readiness(
    dom: &dyn DomPort,
    frames: &dyn FrameClock,
    root: NodeId,
    min_signals: usize,
    timeout: Duration,
) -> DataSignals {
    let start = Instant::now();
    loop {
        let signals = check_signals(dom, root);
        if is_ready(&signals, min_signals) {
            debug!(%root, ?signals, "Player data ready");
            return signals;
        }
        if start.elapsed() >= timeout {
            warn!(%root, ?signals, ?timeout, "Data readiness timeout, proceeding with partial data");
            return signals;
        }
        frames.next_frame().await;
    }
}
