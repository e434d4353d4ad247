//! Metric names, thresholds and display constants.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Maximum number of smoothed values kept per metric.
pub const MAX_HISTORY: usize = 60;

/// Receives one raw sample.
pub type SampleCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// A lag metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    Ping,
    Fps,
    InputLatency,
    MoveRtt,
}

impl MetricName {
    /// Every metric, in display order.
    pub const ALL: [MetricName; 4] = [
        MetricName::Ping,
        MetricName::Fps,
        MetricName::InputLatency,
        MetricName::MoveRtt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Ping => "ping",
            MetricName::Fps => "fps",
            MetricName::InputLatency => "inputLatency",
            MetricName::MoveRtt => "moveRtt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricName::Ping => "Ping",
            MetricName::Fps => "FPS",
            MetricName::InputLatency => "Input",
            MetricName::MoveRtt => "Move RTT",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricName::Fps => "",
            MetricName::Ping | MetricName::InputLatency | MetricName::MoveRtt => "ms",
        }
    }

    pub fn thresholds(&self) -> MetricThresholds {
        match self {
            MetricName::Ping => MetricThresholds::lower_is_better(50.0, 150.0),
            MetricName::Fps => MetricThresholds::higher_is_better(55.0, 30.0),
            MetricName::InputLatency => MetricThresholds::lower_is_better(50.0, 150.0),
            MetricName::MoveRtt => MetricThresholds::lower_is_better(200.0, 500.0),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health classification of a smoothed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricHealth {
    Good,
    Degraded,
    Poor,
    #[default]
    Unknown,
}

impl MetricHealth {
    /// Dot and sparkline stroke color.
    pub fn color(&self) -> &'static str {
        match self {
            MetricHealth::Good => "#10b981",
            MetricHealth::Degraded => "#f59e0b",
            MetricHealth::Poor => "#ef4444",
            MetricHealth::Unknown => "#6b7280",
        }
    }

    /// Color of the numeric value.
    pub fn value_color(&self) -> &'static str {
        match self {
            MetricHealth::Good => "#6ee7b7",
            MetricHealth::Degraded => "#fcd34d",
            MetricHealth::Poor => "#fca5a5",
            MetricHealth::Unknown => "#e2e8f0",
        }
    }

    pub fn spark_fill_color(&self) -> &'static str {
        match self {
            MetricHealth::Good => "rgba(16, 185, 129, 0.12)",
            MetricHealth::Degraded => "rgba(245, 158, 11, 0.12)",
            MetricHealth::Poor => "rgba(239, 68, 68, 0.12)",
            MetricHealth::Unknown => "rgba(255, 255, 255, 0.06)",
        }
    }

    /// Severity rank: higher is worse, `Unknown` lowest.
    pub fn severity(&self) -> u8 {
        match self {
            MetricHealth::Unknown => 0,
            MetricHealth::Good => 1,
            MetricHealth::Degraded => 2,
            MetricHealth::Poor => 3,
        }
    }
}

impl fmt::Display for MetricHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricHealth::Good => "good",
            MetricHealth::Degraded => "degraded",
            MetricHealth::Poor => "poor",
            MetricHealth::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Boundaries between good, degraded and poor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricThresholds {
    /// Bound of the good band (inclusive).
    pub good: f64,
    /// Bound of the degraded band (inclusive).
    pub degraded: f64,
    pub higher_is_better: bool,
}

impl MetricThresholds {
    pub const fn lower_is_better(good: f64, degraded: f64) -> Self {
        Self {
            good,
            degraded,
            higher_is_better: false,
        }
    }

    pub const fn higher_is_better(good: f64, degraded: f64) -> Self {
        Self {
            good,
            degraded,
            higher_is_better: true,
        }
    }

    pub fn classify(&self, value: f64) -> MetricHealth {
        if self.higher_is_better {
            if value >= self.good {
                MetricHealth::Good
            } else if value >= self.degraded {
                MetricHealth::Degraded
            } else {
                MetricHealth::Poor
            }
        } else if value <= self.good {
            MetricHealth::Good
        } else if value <= self.degraded {
            MetricHealth::Degraded
        } else {
            MetricHealth::Poor
        }
    }
}

/// Aggregated state of one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricState {
    /// EMA-smoothed value.
    pub value: Option<f64>,
    pub health: MetricHealth,
    /// Most recent raw sample.
    pub raw_latest: Option<f64>,
    pub sample_count: u64,
    /// Unix time of the last sample, in milliseconds.
    pub last_updated: i64,
    /// Recent smoothed values, oldest first.
    pub history: Vec<f64>,
}

/// Snapshot of every metric.
pub type LagMetrics = BTreeMap<MetricName, MetricState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_boundaries() {
        let ping = MetricName::Ping.thresholds();
        assert_eq!(ping.classify(50.0), MetricHealth::Good);
        assert_eq!(ping.classify(50.01), MetricHealth::Degraded);
        assert_eq!(ping.classify(150.0), MetricHealth::Degraded);
        assert_eq!(ping.classify(150.01), MetricHealth::Poor);
    }

    #[test]
    fn test_fps_is_higher_is_better() {
        let fps = MetricName::Fps.thresholds();
        assert_eq!(fps.classify(60.0), MetricHealth::Good);
        assert_eq!(fps.classify(55.0), MetricHealth::Good);
        assert_eq!(fps.classify(30.0), MetricHealth::Degraded);
        assert_eq!(fps.classify(29.9), MetricHealth::Poor);
    }

    #[test]
    fn test_metric_name_serde() {
        let json = serde_json::to_string(&MetricName::InputLatency).unwrap();
        assert_eq!(json, "\"inputLatency\"");
        let name: MetricName = serde_json::from_str("\"moveRtt\"").unwrap();
        assert_eq!(name, MetricName::MoveRtt);
        assert_eq!(MetricHealth::Degraded.to_string(), "degraded");
    }
}
