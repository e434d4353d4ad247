//! Transformation orchestrator.
//!
//! Sequences one transformation per qualifying page:
//!
//! ```text
//! IDLE -> WAITING_FOR_STRUCTURE -> WAITING_FOR_DATA -> TRANSFORMING -> COMPLETED
//!                                        |                  |
//!                                        +----> FAILED <----+
//! ```
//!
//! Navigating away or disabling the feature returns to `IDLE` from any state
//! and reverts the page. A new navigation supersedes a running sequence: the
//! old one is cancelled and its generation retired, so it can never write
//! state again.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chesskit_protocols::{FrameClock, LocationSource};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::engine::{ApplyOutcome, LayoutEngine};
use crate::navigation::{is_game_page, NavigationCallback, NavigationMonitor};
use crate::readiness::wait_for_readiness;
use crate::watchdog::MutationWatchdog;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Orchestrator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    WaitingForStructure,
    WaitingForData,
    Transforming,
    Completed,
    Failed,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorState::Idle => "IDLE",
            OrchestratorState::WaitingForStructure => "WAITING_FOR_STRUCTURE",
            OrchestratorState::WaitingForData => "WAITING_FOR_DATA",
            OrchestratorState::Transforming => "TRANSFORMING",
            OrchestratorState::Completed => "COMPLETED",
            OrchestratorState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Sequence {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives navigation detection, waits and the layout engine for one page.
pub struct TransformationOrchestrator {
    engine: Arc<LayoutEngine>,
    watchdog: MutationWatchdog,
    navigation: NavigationMonitor,
    location: Arc<dyn LocationSource>,
    frames: Arc<dyn FrameClock>,
    config: Mutex<LayoutConfig>,
    state: watch::Sender<OrchestratorState>,
    /// Guards sequence hand-over; state writes from a sequence happen under it.
    sequence: Mutex<Option<Sequence>>,
    generation: AtomicU64,
    active: AtomicBool,
}

impl TransformationOrchestrator {
    pub fn new(
        engine: Arc<LayoutEngine>,
        frames: Arc<dyn FrameClock>,
        location: Arc<dyn LocationSource>,
        config: LayoutConfig,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(OrchestratorState::Idle);
        Arc::new(Self {
            watchdog: MutationWatchdog::new(engine.clone()),
            navigation: NavigationMonitor::new(location.clone(), poll_interval),
            engine,
            location,
            frames,
            config: Mutex::new(config),
            state,
            sequence: Mutex::new(None),
            generation: AtomicU64::new(0),
            active: AtomicBool::new(false),
        })
    }

    /// Start watching navigation and handle the current page.
    pub fn start(self: &Arc<Self>) {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already active");
            return;
        }
        info!("Orchestrator started");

        let weak: Weak<Self> = Arc::downgrade(self);
        let callback: NavigationCallback = Arc::new(move |url: &str| {
            if let Some(orchestrator) = weak.upgrade() {
                orchestrator.handle_navigation(url);
            }
        });
        self.navigation.start(callback);

        let url = self.location.current_url();
        if is_game_page(&url) {
            self.begin_sequence();
        }
    }

    /// Stop watching navigation and revert the page.
    pub fn stop(&self) {
        self.navigation.stop();
        self.cleanup();
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Orchestrator stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Replace the layout configuration. Restarts the sequence when on a
    /// game page, reverts when the layout is now disabled.
    pub fn update_config(self: &Arc<Self>, config: LayoutConfig) {
        *self.config.lock() = config;
        if !config.enabled() {
            self.cleanup();
        } else if self.is_active() && is_game_page(&self.location.current_url()) {
            self.begin_sequence();
        }
    }

    pub fn config(&self) -> LayoutConfig {
        *self.config.lock()
    }

    /// React to the page URL having changed to `url`.
    pub fn handle_navigation(self: &Arc<Self>, url: &str) {
        if is_game_page(url) {
            info!(url, "Game page detected");
            self.begin_sequence();
        } else {
            debug!(url, "Left game page");
            self.cleanup();
        }
    }

    /// Forward a history API notification to the navigation monitor.
    pub fn notify_popstate(&self) -> bool {
        self.navigation.notify_popstate()
    }

    /// Cancel any running sequence, stop the watchdog and revert the page.
    pub fn cleanup(&self) {
        let previous = {
            let mut sequence = self.sequence.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            sequence.take()
        };
        if let Some(previous) = previous {
            previous.cancel.cancel();
            previous.task.abort();
        }
        self.watchdog.stop();
        self.engine.revert();
        self.set_state(OrchestratorState::Idle);
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    pub fn engine(&self) -> &Arc<LayoutEngine> {
        &self.engine
    }

    pub fn watchdog(&self) -> &MutationWatchdog {
        &self.watchdog
    }

    fn set_state(&self, state: OrchestratorState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "Orchestrator state changed");
        }
    }

    /// Supersede whatever is running with a fresh sequence.
    fn begin_sequence(self: &Arc<Self>) {
        let config = self.config();
        if !config.enabled() {
            debug!("Layout disabled, not transforming");
            return;
        }

        self.cleanup();

        let mut sequence = self.sequence.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(OrchestratorState::WaitingForStructure);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.clone().run_sequence(generation, cancel.clone(), config));
        *sequence = Some(Sequence { cancel, task });
    }

    /// Move to `state` unless the sequence `generation` was superseded. Must
    /// be called with the sequence lock held.
    fn transition(&self, generation: u64, state: OrchestratorState) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, %state, "Superseded sequence, dropping transition");
            return false;
        }
        self.set_state(state);
        true
    }

    async fn run_sequence(
        self: Arc<Self>,
        generation: u64,
        cancel: CancellationToken,
        config: LayoutConfig,
    ) {
        while !self.engine.structure_present() {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = self.frames.next_frame() => {}
            }
        }
        debug!("Page structure present");

        let anchors = {
            let _sequence = self.sequence.lock();
            if !self.transition(generation, OrchestratorState::WaitingForData) {
                return;
            }
            match self.engine.locate() {
                Ok(anchors) => anchors,
                Err(e) => {
                    warn!(error = %e, "Player containers vanished");
                    self.transition(generation, OrchestratorState::Failed);
                    return;
                }
            }
        };

        if config.reposition_player_cards {
            let dom = &**self.engine.dom();
            let frames = &*self.frames;
            let waits = async {
                futures::join!(
                    wait_for_readiness(
                        dom,
                        frames,
                        anchors.player_top,
                        config.min_signals,
                        config.readiness_timeout
                    ),
                    wait_for_readiness(
                        dom,
                        frames,
                        anchors.player_bottom,
                        config.min_signals,
                        config.readiness_timeout
                    ),
                )
            };
            let (top, bottom) = tokio::select! {
                _ = cancel.cancelled() => return,
                signals = waits => signals,
            };
            debug!(top = top.count(), bottom = bottom.count(), "Player data resolved");
        }

        let _sequence = self.sequence.lock();
        if !self.transition(generation, OrchestratorState::Transforming) {
            return;
        }
        match self.engine.apply_prepared(&config) {
            Ok(ApplyOutcome::StylesOnly) => {
                self.transition(generation, OrchestratorState::Completed);
            }
            Ok(outcome) => {
                debug!(?outcome, "Transform finished");
                self.transition(generation, OrchestratorState::Completed);
                self.watchdog.start(config);
            }
            Err(e) => {
                warn!(error = %e, "Transformation failed");
                self.transition(generation, OrchestratorState::Failed);
            }
        }
    }
}
