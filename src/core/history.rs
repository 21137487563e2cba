use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::models::Snapshot;

pub const DEFAULT_RETENTION_MINUTES: i64 = 360;

/// Per-instrument rolling log of snapshots, pruned lazily on every append.
///
/// All writes go through `&mut self`, so a store has exactly one writer at a
/// time. Callers that fan fetches out across tasks must funnel the resulting
/// `record` calls back through the single owner.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    retention: Duration,
    windows: HashMap<String, Vec<Snapshot>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_RETENTION_MINUTES))
    }
}

impl HistoryStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            windows: HashMap::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append a snapshot to its instrument's window, then evict everything
    /// older than the retention horizon measured from the newest entry.
    pub fn record(&mut self, snapshot: Snapshot) {
        let window = self
            .windows
            .entry(snapshot.instrument_id.clone())
            .or_default();

        // Validation rejects out-of-order input upstream; keep the window
        // sorted even if a caller skips it.
        let in_order = window
            .last()
            .map_or(true, |last| last.timestamp <= snapshot.timestamp);
        if in_order {
            window.push(snapshot);
        } else {
            let at = window.partition_point(|s| s.timestamp <= snapshot.timestamp);
            window.insert(at, snapshot);
        }

        if let Some(newest) = window.last().map(|s| s.timestamp) {
            let cutoff = newest - self.retention;
            let stale = window.partition_point(|s| s.timestamp < cutoff);
            if stale > 0 {
                window.drain(..stale);
            }
        }
    }

    /// Retained snapshots for an instrument, oldest first. Empty if unseen.
    pub fn get_window(&self, instrument_id: &str) -> &[Snapshot] {
        self.windows
            .get(instrument_id)
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }

    pub fn latest(&self, instrument_id: &str) -> Option<&Snapshot> {
        self.windows.get(instrument_id).and_then(|w| w.last())
    }

    pub fn last_timestamp(&self, instrument_id: &str) -> Option<DateTime<Utc>> {
        self.latest(instrument_id).map(|s| s.timestamp)
    }

    pub fn len(&self, instrument_id: &str) -> usize {
        self.get_window(instrument_id).len()
    }

    pub fn instrument_count(&self) -> usize {
        self.windows.len()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(|k| k.as_str())
    }
}
