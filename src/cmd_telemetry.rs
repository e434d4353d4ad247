//! Telemetry subcommand handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use chesskit_config::RuntimeSettings;
use chesskit_monitor::{HttpPingProbe, MetricAggregator, MetricName, PingMonitor};

use crate::cli::TelemetryAction;

const DEFAULT_PING_URL: &str = "https://www.chess.com/";

pub(crate) async fn handle_telemetry_command(
    action: TelemetryAction,
    settings: &RuntimeSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TelemetryAction::Ping { url, count } => {
            let url = url
                .or_else(|| settings.telemetry.ping_url.clone())
                .unwrap_or_else(|| DEFAULT_PING_URL.to_string());
            ping(&url, count, settings).await
        }
    }
}

async fn ping(
    url: &str,
    count: u32,
    settings: &RuntimeSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let probe = HttpPingProbe::new(url)?;
    println!("Probing {} every {:?}", probe.target(), settings.telemetry.ping_interval());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let monitor = PingMonitor::new(Arc::new(probe), settings.telemetry.ping_interval());
    monitor.start(Arc::new(move |ms: f64| {
        let _ = tx.send(ms);
    }));

    let mut aggregator = MetricAggregator::new();
    println!("{:<6} {:>10} {:>10}  {}", "#", "RAW", "SMOOTHED", "HEALTH");
    for i in 1..=count {
        let Some(ms) = rx.recv().await else { break };
        aggregator.add_sample(MetricName::Ping, ms);
        let state = aggregator.metric(MetricName::Ping);
        println!(
            "{:<6} {:>8}ms {:>8}ms  {}",
            i,
            ms,
            state.value.map(f64::round).unwrap_or_default(),
            state.health
        );
    }
    monitor.stop();

    println!("Overall: {}", aggregator.overall_health());
    Ok(())
}
