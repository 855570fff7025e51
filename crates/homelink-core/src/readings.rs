use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Hourly aggregates retained, newest first.
pub const MAX_AGGREGATES: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub value: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAggregate {
    pub value: f64,
    pub ts: DateTime<Utc>,
}

/// Two layered windows of temperature readings: short-term raw samples and
/// hourly rollups with bounded retention.
#[derive(Debug, Default)]
pub struct ReadingStore {
    raw: Vec<RawSample>,
    aggregates: Vec<HourlyAggregate>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample (no dedup), then purges samples past the horizon.
    pub fn record_raw(&mut self, value: f64, ts: DateTime<Utc>) {
        self.raw.push(RawSample { value, ts });
        self.purge_raw(ts);
    }

    // Horizon = now minus the current minute-of-hour: the window collapses
    // at the top of each hour and stretches to ~59 minutes just before it.
    // The hourly rollup averages whatever this window holds. See DESIGN.md.
    fn purge_raw(&mut self, now: DateTime<Utc>) {
        let horizon = now - Duration::minutes(i64::from(now.minute()));
        self.raw.retain(|sample| sample.ts >= horizon);
    }

    /// Mean of the retained raw window, truncated (not rounded) to one
    /// decimal. `None` when the window is empty: nothing to persist.
    pub fn rollup_hour(&self, now: DateTime<Utc>) -> Option<HourlyAggregate> {
        if self.raw.is_empty() {
            return None;
        }

        let sum: f64 = self.raw.iter().map(|sample| sample.value).sum();
        let mean = sum / self.raw.len() as f64;
        Some(HourlyAggregate {
            value: (mean * 10.0).trunc() / 10.0,
            ts: now,
        })
    }

    pub fn insert_aggregate(&mut self, aggregate: HourlyAggregate) {
        self.aggregates.push(aggregate);
        self.aggregates.sort_by(|a, b| b.ts.cmp(&a.ts));
    }

    /// Drops the oldest aggregates beyond [`MAX_AGGREGATES`].
    pub fn prune_aggregates(&mut self) {
        self.aggregates.truncate(MAX_AGGREGATES);
    }

    pub fn current_raw(&self) -> Option<&RawSample> {
        self.raw.last()
    }

    /// Newest first.
    pub fn all_aggregates(&self) -> &[HourlyAggregate] {
        &self.aggregates
    }

    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    /// One-time cleanup at process start: stale samples and excess
    /// aggregates left over from preloaded state.
    pub fn startup_sweep(&mut self, now: DateTime<Utc>) {
        self.purge_raw(now);
        self.prune_aggregates();
    }
}
