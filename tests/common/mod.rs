#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

use oi_scanner::config::Config;
use oi_scanner::feed::{FeedError, SnapshotFeed};
use oi_scanner::models::{Observation, Snapshot, Technicals};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T04:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn snap(id: &str, minutes: i64, oi: f64, price: f64) -> Snapshot {
    Snapshot::new(id, base_time() + Duration::minutes(minutes), oi, price)
}

pub fn obs(id: &str, minutes: i64, oi: f64, price: f64, technicals: Technicals) -> Observation {
    Observation::new(snap(id, minutes, oi, price), technicals)
}

pub fn technicals(rsi: f64, adx: f64, volume_ratio: f64) -> Technicals {
    Technicals {
        rsi,
        adx,
        volume_ratio,
        ..Default::default()
    }
}

/// Config with the given instruments and no market-hours gate.
pub fn test_config(instruments: &[&str]) -> Config {
    let mut cfg = Config::from_env();
    cfg.instruments = instruments.iter().map(|s| s.to_string()).collect();
    cfg.benchmark = Some("NIFTY".to_string());
    cfg.market_hours_only = false;
    cfg.retention_minutes = 360;
    cfg.fetch_timeout_secs = 1;
    cfg.thresholds_file = None;
    cfg.strength_tiers = Default::default();
    cfg.setup = Default::default();
    cfg.conviction = Default::default();
    cfg
}

/// Feed that hands out queued responses per instrument; an empty queue is NotFound.
#[derive(Default)]
pub struct ScriptedFeed {
    queues: HashMap<String, VecDeque<Result<Observation, FeedError>>>,
    pub calls: usize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&mut self, o: Observation) {
        self.queues
            .entry(o.instrument_id().to_string())
            .or_default()
            .push_back(Ok(o));
    }

    pub fn push_err(&mut self, id: &str, e: FeedError) {
        self.queues.entry(id.to_string()).or_default().push_back(Err(e));
    }
}

#[async_trait]
impl SnapshotFeed for ScriptedFeed {
    async fn fetch(&mut self, instrument_id: &str) -> Result<Observation, FeedError> {
        self.calls += 1;
        self.queues
            .get_mut(instrument_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(FeedError::NotFound(instrument_id.to_string())))
    }
}

/// Feed that never answers one instrument in time.
pub struct StallingFeed {
    pub inner: ScriptedFeed,
    pub stalled: String,
}

#[async_trait]
impl SnapshotFeed for StallingFeed {
    async fn fetch(&mut self, instrument_id: &str) -> Result<Observation, FeedError> {
        if instrument_id == self.stalled {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        }
        self.inner.fetch(instrument_id).await
    }
}
