//! Lag telemetry facade.
//!
//! Owns the four sample sources, feeds them into one [`MetricAggregator`]
//! and repaints the [`LagOverlay`] on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use chesskit_config::TelemetrySettings;
use chesskit_protocols::{DomPort, FrameClock, NodeId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::MetricAggregator;
use crate::error::MonitorError;
use crate::fps::FpsMonitor;
use crate::input::InputMonitor;
use crate::overlay::LagOverlay;
use crate::page_bridge::{page_channel, PageReceiver, PageScriptMessage, PageSender};
use crate::ping::{PingMonitor, PingProbe};
use crate::types::{LagMetrics, MetricHealth, MetricName, SampleCallback};

struct Running {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub struct LagTelemetry {
    aggregator: Arc<Mutex<MetricAggregator>>,
    overlay: Arc<Mutex<LagOverlay>>,
    ping: PingMonitor,
    fps: FpsMonitor,
    input: InputMonitor,
    page_sender: PageSender,
    page_receiver: Arc<tokio::sync::Mutex<PageReceiver>>,
    refresh: Duration,
    running: Mutex<Option<Running>>,
}

impl LagTelemetry {
    pub fn new(
        dom: Arc<dyn DomPort>,
        frames: Arc<dyn FrameClock>,
        probe: Arc<dyn PingProbe>,
        settings: &TelemetrySettings,
    ) -> Self {
        let (page_sender, page_receiver) = page_channel();
        Self {
            aggregator: Arc::new(Mutex::new(MetricAggregator::new())),
            overlay: Arc::new(Mutex::new(LagOverlay::new(dom.clone()))),
            ping: PingMonitor::new(probe, settings.ping_interval()),
            fps: FpsMonitor::new(frames, settings.fps_report()),
            input: InputMonitor::new(dom, settings.input_timeout()),
            page_sender,
            page_receiver: Arc::new(tokio::sync::Mutex::new(page_receiver)),
            refresh: settings.overlay_refresh(),
            running: Mutex::new(None),
        }
    }

    fn sink(&self, name: MetricName) -> SampleCallback {
        let aggregator = self.aggregator.clone();
        Arc::new(move |raw: f64| aggregator.lock().add_sample(name, raw))
    }

    /// Start sampling and show the overlay. No-op when already running.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Ok(());
        }

        self.overlay.lock().create()?;

        self.ping.start(self.sink(MetricName::Ping));
        self.fps.start(self.sink(MetricName::Fps));
        self.input.start(self.sink(MetricName::InputLatency));

        let cancel = CancellationToken::new();
        let tasks = vec![self.spawn_refresh(cancel.clone()), self.spawn_bridge(cancel.clone())];
        *running = Some(Running { cancel, tasks });

        info!("Lag telemetry started");
        Ok(())
    }

    fn spawn_refresh(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let aggregator = self.aggregator.clone();
        let overlay = self.overlay.clone();
        let period = self.refresh;
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let metrics = aggregator.lock().metrics();
                overlay.lock().update(&metrics);
            }
        })
    }

    fn spawn_bridge(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let aggregator = self.aggregator.clone();
        let receiver = self.page_receiver.clone();
        tokio::spawn(async move {
            let mut receiver = receiver.lock().await;
            // Reports from a previous session are stale.
            while receiver.try_recv().is_ok() {}
            loop {
                let detail = tokio::select! {
                    _ = cancel.cancelled() => break,
                    detail = receiver.recv() => detail,
                };
                let Some(detail) = detail else { break };
                match PageScriptMessage::parse(&detail) {
                    Ok(message) => aggregator.lock().add_sample(MetricName::MoveRtt, message.rtt),
                    Err(e) => debug!(error = %e, "Ignoring page message"),
                }
            }
        })
    }

    /// Stop sampling, remove the overlay and forget all samples.
    pub fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        running.cancel.cancel();
        for task in running.tasks {
            task.abort();
        }
        self.ping.stop();
        self.fps.stop();
        self.input.stop();
        self.overlay.lock().remove();
        self.aggregator.lock().reset();
        info!("Lag telemetry stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Channel the page script reports move round trips on.
    pub fn page_sender(&self) -> PageSender {
        self.page_sender.clone()
    }

    /// Forward a pointer-down from the page.
    pub fn pointer_down(&self, target: NodeId) -> bool {
        self.input.pointer_down(target)
    }

    /// Overlay header click.
    pub fn toggle_overlay_collapse(&self) -> bool {
        self.overlay.lock().toggle_collapse()
    }

    pub fn overlay_present(&self) -> bool {
        self.overlay.lock().is_present()
    }

    pub fn metrics(&self) -> LagMetrics {
        self.aggregator.lock().metrics()
    }

    pub fn overall_health(&self) -> MetricHealth {
        self.aggregator.lock().overall_health()
    }
}

impl Drop for LagTelemetry {
    fn drop(&mut self) {
        self.stop();
    }
}
