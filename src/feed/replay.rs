use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::feed::{FeedError, SnapshotFeed};
use crate::models::{Observation, Snapshot, Technicals};

/// One line of a recorded session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub instrument_id: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub open_interest: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(flatten)]
    pub technicals: Technicals,
}

impl From<ReplayRecord> for Observation {
    fn from(r: ReplayRecord) -> Self {
        Observation {
            snapshot: Snapshot::new(&r.instrument_id, r.timestamp, r.open_interest, r.price),
            volume: r.volume,
            technicals: r.technicals,
            prev_close: r.prev_close,
        }
    }
}

/// A feed that replays recorded observations against a movable clock.
/// Only observations at or before `now` are visible, and each one is served once.
pub struct ReplayFeed {
    data: HashMap<String, Vec<Observation>>,
    served: HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
}

impl ReplayFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            served: HashMap::new(),
            now: Utc::now(),
        }
    }

    pub fn from_records(records: Vec<ReplayRecord>) -> Self {
        let mut feed = Self::new();
        for record in records {
            feed.push(record.into());
        }
        feed
    }

    /// Load a JSON array of `ReplayRecord`s.
    pub fn load_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay file {}", path))?;
        let records: Vec<ReplayRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse replay file {}", path))?;
        Ok(Self::from_records(records))
    }

    pub fn push(&mut self, obs: Observation) {
        let series = self
            .data
            .entry(obs.instrument_id().to_string())
            .or_default();
        let at = series.partition_point(|o| o.snapshot.timestamp <= obs.snapshot.timestamp);
        series.insert(at, obs);
    }

    pub fn set_time(&mut self, t: DateTime<Utc>) {
        self.now = t;
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn instruments(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.data.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn earliest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.first().map(|o| o.snapshot.timestamp))
            .min()
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.data
            .values()
            .filter_map(|v| v.last().map(|o| o.snapshot.timestamp))
            .max()
    }

    fn visible(&self, instrument_id: &str) -> Option<&Observation> {
        let series = self.data.get(instrument_id)?;
        match series.partition_point(|o| o.snapshot.timestamp <= self.now) {
            0 => None,
            n => series.get(n - 1),
        }
    }
}

impl Default for ReplayFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotFeed for ReplayFeed {
    async fn fetch(&mut self, instrument_id: &str) -> Result<Observation, FeedError> {
        let obs = self
            .visible(instrument_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(instrument_id.to_string()))?;

        let ts = obs.snapshot.timestamp;
        if self.served.get(instrument_id) == Some(&ts) {
            return Err(FeedError::NotFound(format!("{} (no update)", instrument_id)));
        }
        self.served.insert(instrument_id.to_string(), ts);
        Ok(obs)
    }
}
