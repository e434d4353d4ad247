//! # Chesskit Monitor
//!
//! Lag telemetry for the game page. Four sources produce raw samples:
//!
//! - [`PingMonitor`]: HTTP round trip to the page origin
//! - [`FpsMonitor`]: animation frame rate
//! - [`InputMonitor`]: pointer-down to board repaint
//! - the page bridge: move round trips reported by the page script
//!
//! [`MetricAggregator`] smooths and classifies them, and [`LagOverlay`]
//! renders the result. [`LagTelemetry`] wires everything together.

pub mod aggregator;
pub mod error;
pub mod fps;
pub mod input;
pub mod overlay;
pub mod page_bridge;
pub mod ping;
pub mod telemetry;
pub mod types;

pub use aggregator::{MetricAggregator, EMA_ALPHA};
pub use error::MonitorError;
pub use fps::FpsMonitor;
pub use input::InputMonitor;
pub use overlay::{render_rows, sparkline, LagOverlay, OverlayRow, Sparkline, OVERLAY_ID};
pub use page_bridge::{page_channel, PageReceiver, PageScriptMessage, PageSender, WsRttTracker};
pub use ping::{HttpPingProbe, PingMonitor, PingProbe};
pub use telemetry::LagTelemetry;
pub use types::{
    LagMetrics, MetricHealth, MetricName, MetricState, MetricThresholds, SampleCallback,
};
