//! Metric aggregation.
//!
//! Raw samples are smoothed with an exponential moving average and the
//! smoothed value is classified against per-metric thresholds.

use std::collections::VecDeque;

use chrono::Utc;

use crate::types::{LagMetrics, MetricHealth, MetricName, MetricState, MAX_HISTORY};

/// Weight of the newest sample.
pub const EMA_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<f64>,
    health: MetricHealth,
    raw_latest: Option<f64>,
    sample_count: u64,
    last_updated: i64,
    history: VecDeque<f64>,
}

impl Slot {
    fn state(&self) -> MetricState {
        MetricState {
            value: self.value,
            health: self.health,
            raw_latest: self.raw_latest,
            sample_count: self.sample_count,
            last_updated: self.last_updated,
            history: self.history.iter().copied().collect(),
        }
    }
}

/// EMA state for every [`MetricName`].
#[derive(Debug, Clone, Default)]
pub struct MetricAggregator {
    slots: [Slot; 4],
}

fn index(name: MetricName) -> usize {
    match name {
        MetricName::Ping => 0,
        MetricName::Fps => 1,
        MetricName::InputLatency => 2,
        MetricName::MoveRtt => 3,
    }
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw sample.
    pub fn add_sample(&mut self, name: MetricName, raw: f64) {
        self.add_sample_at(name, raw, Utc::now().timestamp_millis());
    }

    /// Feed one raw sample taken at `timestamp_ms`.
    pub fn add_sample_at(&mut self, name: MetricName, raw: f64, timestamp_ms: i64) {
        let slot = &mut self.slots[index(name)];
        let smoothed = match slot.value {
            None => raw,
            Some(previous) => EMA_ALPHA * raw + (1.0 - EMA_ALPHA) * previous,
        };

        slot.value = Some(smoothed);
        slot.raw_latest = Some(raw);
        slot.sample_count += 1;
        slot.last_updated = timestamp_ms;
        slot.health = name.thresholds().classify(smoothed);

        slot.history.push_back(smoothed);
        while slot.history.len() > MAX_HISTORY {
            slot.history.pop_front();
        }
    }

    pub fn metric(&self, name: MetricName) -> MetricState {
        self.slots[index(name)].state()
    }

    /// Snapshot of every metric.
    pub fn metrics(&self) -> LagMetrics {
        MetricName::ALL
            .into_iter()
            .map(|name| (name, self.metric(name)))
            .collect()
    }

    /// Worst health among metrics that have received samples; `Unknown`
    /// when none has.
    pub fn overall_health(&self) -> MetricHealth {
        self.slots
            .iter()
            .filter(|slot| slot.sample_count > 0)
            .map(|slot| slot.health)
            .max_by_key(MetricHealth::severity)
            .unwrap_or(MetricHealth::Unknown)
    }

    /// Forget every sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
