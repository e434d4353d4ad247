//! Network latency probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::CACHE_CONTROL;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::MonitorError;
use crate::types::SampleCallback;

/// Default interval between probes.
pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Measures one round trip.
#[async_trait]
pub trait PingProbe: Send + Sync {
    async fn probe(&self) -> Result<Duration, MonitorError>;
}

/// `HEAD /favicon.ico` against the page origin, uncached.
pub struct HttpPingProbe {
    target: Url,
    client: reqwest::Client,
}

impl HttpPingProbe {
    /// Probe the origin of `page_url`.
    pub fn new(page_url: &str) -> Result<Self, MonitorError> {
        let target = Url::parse(page_url)?.join("/favicon.ico")?;
        Ok(Self {
            target,
            client: reqwest::Client::new(),
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }
}

#[async_trait]
impl PingProbe for HttpPingProbe {
    async fn probe(&self) -> Result<Duration, MonitorError> {
        let start = Instant::now();
        self.client
            .head(self.target.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| MonitorError::Probe(format!("HEAD {} failed: {}", self.target, e)))?;
        Ok(start.elapsed())
    }
}

/// Probes immediately on start, then every interval.
pub struct PingMonitor {
    probe: Arc<dyn PingProbe>,
    interval: Duration,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl PingMonitor {
    pub fn new(probe: Arc<dyn PingProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            running: Mutex::new(None),
        }
    }

    /// Start probing; `callback` receives the round trip in whole
    /// milliseconds. No-op when already running.
    pub fn start(&self, callback: SampleCallback) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let probe = self.probe.clone();
        let period = self.interval;
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = probe.probe() => result,
                };
                match result {
                    Ok(rtt) => {
                        let ms = (rtt.as_secs_f64() * 1000.0).round();
                        trace!(ms, "Ping sample");
                        callback(ms);
                    }
                    Err(e) => debug!(error = %e, "Ping sample skipped"),
                }
            }
        });
        *running = Some((cancel, task));
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Stop probing. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some((cancel, task)) = self.running.lock().take() {
            cancel.cancel();
            task.abort();
        }
    }
}

impl Drop for PingMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
