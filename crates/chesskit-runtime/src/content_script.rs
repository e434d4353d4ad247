//! Content script: the per-page entry point.
//!
//! Loads the stored configuration, drives the orchestrator and the lag
//! telemetry from it, and answers messages from the extension's UI surfaces.

use std::sync::{Arc, Weak};

use chesskit_config::{ChessKitConfig, ConfigRepository, RuntimeSettings};
use chesskit_layout::{LayoutConfig, LayoutEngine, TransformationOrchestrator};
use chesskit_monitor::{LagTelemetry, PageSender, PingProbe};
use chesskit_protocols::{
    ConfigStore, DomPort, ExtensionMessage, FrameClock, LocationSource, MessageResponse, NodeId,
    TransformationStatus,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::debug_overlay::DebugOverlay;
use crate::error::RuntimeError;

pub struct ContentScript {
    repository: ConfigRepository,
    settings: RuntimeSettings,
    engine: Arc<LayoutEngine>,
    orchestrator: Arc<TransformationOrchestrator>,
    telemetry: LagTelemetry,
    debug_overlay: Mutex<DebugOverlay>,
    current: Mutex<Option<ChessKitConfig>>,
    status_watch: Mutex<Option<JoinHandle<()>>>,
}

impl ContentScript {
    pub fn new(
        dom: Arc<dyn DomPort>,
        frames: Arc<dyn FrameClock>,
        location: Arc<dyn LocationSource>,
        store: Arc<dyn ConfigStore>,
        probe: Arc<dyn PingProbe>,
        settings: RuntimeSettings,
    ) -> Arc<Self> {
        let engine = Arc::new(LayoutEngine::new(dom.clone(), frames.clone()));
        // Nothing is applied until a stored config says so.
        let initial = LayoutConfig {
            compact_sidebar: false,
            reposition_player_cards: false,
            ..LayoutConfig::default().with_settings(&settings.layout)
        };
        let orchestrator = TransformationOrchestrator::new(
            engine.clone(),
            frames.clone(),
            location,
            initial,
            settings.navigation.poll_interval(),
        );
        let telemetry = LagTelemetry::new(dom.clone(), frames, probe, &settings.telemetry);

        Arc::new(Self {
            repository: ConfigRepository::new(store),
            settings,
            engine,
            orchestrator,
            telemetry,
            debug_overlay: Mutex::new(DebugOverlay::new(dom)),
            current: Mutex::new(None),
            status_watch: Mutex::new(None),
        })
    }

    /// Start watching the page and apply the stored configuration.
    pub async fn init(self: &Arc<Self>) -> Result<(), RuntimeError> {
        info!("Initializing content script");
        self.orchestrator.start();
        self.watch_status();
        self.refresh().await
    }

    /// Keep a visible debug overlay in step with the orchestrator.
    fn watch_status(self: &Arc<Self>) {
        let mut slot = self.status_watch.lock();
        if slot.is_some() {
            return;
        }
        let mut states = self.orchestrator.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let Some(script) = weak.upgrade() else { break };
                script.redraw_debug_overlay();
            }
        }));
    }

    /// Reload the configuration from storage and reapply it.
    pub async fn refresh(&self) -> Result<(), RuntimeError> {
        let Some(config) = self.repository.load().await? else {
            warn!("No configuration found");
            return Ok(());
        };
        self.apply_config(config)
    }

    fn layout_config(&self, config: &ChessKitConfig) -> LayoutConfig {
        LayoutConfig::from_config(config).with_settings(&self.settings.layout)
    }

    fn apply_config(&self, config: ChessKitConfig) -> Result<(), RuntimeError> {
        info!(?config, "Applying configuration");
        *self.current.lock() = Some(config);

        self.orchestrator.update_config(self.layout_config(&config));

        if config.lag_overlay {
            self.telemetry.start()?;
        } else {
            self.telemetry.stop();
        }

        self.set_debug_overlay(config.debug_mode)
    }

    fn set_debug_overlay(&self, visible: bool) -> Result<(), RuntimeError> {
        if visible {
            let status = self.status();
            self.debug_overlay.lock().show(&status)?;
        } else {
            self.debug_overlay.lock().hide();
        }
        Ok(())
    }

    fn redraw_debug_overlay(&self) {
        if !self.debug_overlay.lock().is_visible() {
            return;
        }
        if let Err(e) = self.set_debug_overlay(true) {
            warn!(error = %e, "Failed to redraw debug overlay");
        }
    }

    /// Dispatch one message from a UI surface.
    pub async fn handle_message(&self, message: ExtensionMessage) -> MessageResponse {
        debug!(kind = message.kind(), "Received message");
        let result = match message {
            ExtensionMessage::Refresh => self.refresh().await.map(|_| MessageResponse::ok()),
            ExtensionMessage::GetStatus => Ok(MessageResponse::with_status(self.status())),
            ExtensionMessage::Enable => self.set_layout_enabled(true),
            ExtensionMessage::Disable => self.set_layout_enabled(false),
            ExtensionMessage::ToggleDebug => self.toggle_debug(),
        };
        result.unwrap_or_else(|e| {
            error!(kind = message.kind(), error = %e, "Message handling failed");
            MessageResponse::error(e.to_string())
        })
    }

    /// Dispatch a raw JSON message.
    pub async fn handle_raw(&self, message: &Value) -> MessageResponse {
        match ExtensionMessage::from_value(message) {
            Some(message) => self.handle_message(message).await,
            None => {
                warn!(%message, "Unknown message type");
                MessageResponse::unknown()
            }
        }
    }

    /// Legacy on/off switch. Changes the in-memory config only.
    fn set_layout_enabled(&self, enabled: bool) -> Result<MessageResponse, RuntimeError> {
        let current = *self.current.lock();
        if let Some(mut config) = current {
            config.compact_sidebar = enabled;
            config.reposition_player_cards = enabled;
            self.apply_config(config)?;
        }
        Ok(MessageResponse::ok())
    }

    fn toggle_debug(&self) -> Result<MessageResponse, RuntimeError> {
        let toggled = {
            let mut current = self.current.lock();
            current.as_mut().map(|config| {
                config.debug_mode = !config.debug_mode;
                config.debug_mode
            })
        };
        if let Some(visible) = toggled {
            self.set_debug_overlay(visible)?;
        }
        Ok(MessageResponse::ok())
    }

    pub fn status(&self) -> TransformationStatus {
        let enabled = self
            .current
            .lock()
            .is_some_and(|config| config.layout_enabled());
        TransformationStatus {
            enabled,
            player_cards_extracted: self.engine.marker_present(),
            css_injected: self.engine.styles_injected(),
            lag_overlay: self.telemetry.is_running(),
            state: self.orchestrator.state().as_str().to_string(),
        }
    }

    pub fn config(&self) -> Option<ChessKitConfig> {
        *self.current.lock()
    }

    /// A pointer went down on `target` at (`x`, `y`). Returns whether it
    /// started a sidebar resize.
    pub fn pointer_down(&self, target: NodeId, x: f64, y: f64) -> bool {
        self.telemetry.pointer_down(target);
        self.engine.resize_handle() == Some(target) && self.engine.resize_pointer_down(x, y)
    }

    /// New sidebar size while a resize drag is active.
    pub fn pointer_move(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.engine.resize_pointer_move(x, y)
    }

    pub fn pointer_up(&self) -> bool {
        self.engine.resize_pointer_up()
    }

    /// A click landed on `target`.
    pub fn click(&self, target: NodeId) -> bool {
        self.debug_overlay.lock().click(target)
    }

    /// The page's history API fired.
    pub fn notify_popstate(&self) -> bool {
        self.orchestrator.notify_popstate()
    }

    /// Channel for the injected page script.
    pub fn page_sender(&self) -> PageSender {
        self.telemetry.page_sender()
    }

    pub fn orchestrator(&self) -> &Arc<TransformationOrchestrator> {
        &self.orchestrator
    }

    pub fn telemetry(&self) -> &LagTelemetry {
        &self.telemetry
    }

    /// Stop everything and put the page back.
    pub fn shutdown(&self) {
        if let Some(task) = self.status_watch.lock().take() {
            task.abort();
        }
        self.orchestrator.stop();
        self.telemetry.stop();
        self.debug_overlay.lock().hide();
        info!("Content script shut down");
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "content_script_tests.rs"]
mod tests;
