//! Page-script bridge.
//!
//! The script injected into the page wraps the host's WebSocket and reports
//! move round trips back over a one-way, best-effort channel. Messages cross
//! as loose JSON and are validated on arrival.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::MonitorError;

/// Custom event name the page script dispatches on.
pub const WS_EVENT_NAME: &str = "chess-kit-ws-data";

/// Only message kind the page script sends.
pub const WS_RTT: &str = "ws-rtt";

/// Most unanswered sends kept; the oldest is dropped beyond this.
pub const MAX_PENDING: usize = 50;

pub type PageSender = mpsc::UnboundedSender<Value>;
pub type PageReceiver = mpsc::UnboundedReceiver<Value>;

pub fn page_channel() -> (PageSender, PageReceiver) {
    mpsc::unbounded_channel()
}

/// Message from the page script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageScriptMessage {
    #[serde(rename = "type")]
    pub kind: String,
    /// Round trip in milliseconds.
    pub rtt: f64,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

impl PageScriptMessage {
    pub fn ws_rtt(rtt: f64) -> Self {
        Self {
            kind: WS_RTT.to_string(),
            rtt,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Validate an event payload.
    pub fn parse(detail: &Value) -> Result<Self, MonitorError> {
        let message: Self = serde_json::from_value(detail.clone())
            .map_err(|e| MonitorError::InvalidMessage(e.to_string()))?;
        if message.kind != WS_RTT {
            return Err(MonitorError::InvalidMessage(format!(
                "unexpected type {:?}",
                message.kind
            )));
        }
        if !message.rtt.is_finite() || message.rtt < 0.0 {
            return Err(MonitorError::InvalidMessage(format!(
                "rtt out of range: {}",
                message.rtt
            )));
        }
        Ok(message)
    }
}

/// Page-side WebSocket instrumentation: pairs each incoming message with the
/// oldest unanswered send.
#[derive(Debug)]
pub struct WsRttTracker {
    pending: VecDeque<Instant>,
    move_started: Option<Instant>,
    events: PageSender,
}

impl WsRttTracker {
    pub fn new(events: PageSender) -> Self {
        Self {
            pending: VecDeque::new(),
            move_started: None,
            events,
        }
    }

    /// The socket sent a frame.
    pub fn on_send(&mut self) {
        self.pending.push_back(Instant::now());
        while self.pending.len() > MAX_PENDING {
            self.pending.pop_front();
        }
    }

    /// The socket received a frame. Returns the reported round trip.
    pub fn on_message(&mut self) -> Option<f64> {
        let sent = self.pending.pop_front()?;
        Some(self.report(sent))
    }

    /// The host game object started a move.
    pub fn on_move_started(&mut self) {
        self.move_started = Some(Instant::now());
    }

    /// The host game object finished a move.
    pub fn on_move_finished(&mut self) -> Option<f64> {
        let started = self.move_started.take()?;
        Some(self.report(started))
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn report(&self, since: Instant) -> f64 {
        let rtt = (since.elapsed().as_secs_f64() * 1000.0).round();
        // Nobody listening is fine.
        if let Ok(detail) = serde_json::to_value(PageScriptMessage::ws_rtt(rtt)) {
            let _ = self.events.send(detail);
        }
        rtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_valid() {
        let message =
            PageScriptMessage::parse(&json!({"type": "ws-rtt", "rtt": 120, "timestamp": 1})).unwrap();
        assert_eq!(message.rtt, 120.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for detail in [
            json!({"type": "ws-open", "rtt": 1, "timestamp": 1}),
            json!({"type": "ws-rtt", "rtt": "fast", "timestamp": 1}),
            json!({"type": "ws-rtt", "rtt": -4, "timestamp": 1}),
            json!({"type": "ws-rtt"}),
            json!(null),
        ] {
            assert!(
                matches!(
                    PageScriptMessage::parse(&detail),
                    Err(MonitorError::InvalidMessage(_))
                ),
                "{detail}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairs_fifo() {
        let (tx, mut rx) = page_channel();
        let mut tracker = WsRttTracker::new(tx);

        tracker.on_send();
        tokio::time::sleep(Duration::from_millis(30)).await;
        tracker.on_send();
        tokio::time::sleep(Duration::from_millis(70)).await;

        assert_eq!(tracker.on_message(), Some(100.0));
        assert_eq!(tracker.on_message(), Some(70.0));
        assert_eq!(tracker.on_message(), None);

        let first = PageScriptMessage::parse(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first.rtt, 100.0);
        assert_eq!(first.kind, WS_RTT);
    }

    #[tokio::test]
    async fn test_pending_is_capped() {
        let (tx, _rx) = page_channel();
        let mut tracker = WsRttTracker::new(tx);
        for _ in 0..(MAX_PENDING + 10) {
            tracker.on_send();
        }
        assert_eq!(tracker.pending(), MAX_PENDING);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_move_hooks() {
        let (tx, _rx) = page_channel();
        let mut tracker = WsRttTracker::new(tx);
        assert_eq!(tracker.on_move_finished(), None);

        tracker.on_move_started();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(tracker.on_move_finished(), Some(250.0));
        assert_eq!(tracker.on_move_finished(), None);
    }
}
