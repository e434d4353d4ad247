//! Frame rate monitor.

use std::sync::Arc;
use std::time::Duration;

use chesskit_protocols::FrameClock;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::SampleCallback;

/// Minimum time between reports.
pub const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts frames and reports the rate about once per report interval.
pub struct FpsMonitor {
    frames: Arc<dyn FrameClock>,
    report_every: Duration,
    running: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl FpsMonitor {
    pub fn new(frames: Arc<dyn FrameClock>, report_every: Duration) -> Self {
        Self {
            frames,
            report_every,
            running: Mutex::new(None),
        }
    }

    pub fn start(&self, callback: SampleCallback) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let frames = self.frames.clone();
        let report_every = self.report_every;
        let task = tokio::spawn(async move {
            let mut count: u32 = 0;
            let mut last_report = Instant::now();
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = frames.next_frame() => {}
                }
                count += 1;
                let elapsed = last_report.elapsed();
                if elapsed >= report_every {
                    let fps = f64::from(count) / elapsed.as_secs_f64();
                    callback(fps.round());
                    count = 0;
                    last_report = Instant::now();
                }
            }
        });
        *running = Some((cancel, task));
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn stop(&self) {
        if let Some((cancel, task)) = self.running.lock().take() {
            cancel.cancel();
            task.abort();
        }
    }
}

impl Drop for FpsMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
