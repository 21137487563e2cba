use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{Config, StrengthTierTable};
use crate::core::classifier::SetupClassifier;
use crate::core::conviction::ConvictionScorer;
use crate::core::history::HistoryStore;
use crate::core::trend_metrics::{compute_trend_metrics, TrendMetrics};
use crate::core::validation::{validate_snapshot, ValidationError};
use crate::feed::{FeedError, SnapshotFeed};
use crate::models::{MarketBias, Observation, Setup, Technicals};
use crate::scanner::report::{ScanReport, ScanRow, SkippedInstrument};

/// Drives scan cycles: fetch, validate, record, then classify and score every
/// tracked instrument. Owns the history store, so all writes are sequential.
pub struct ScanOrchestrator {
    store: HistoryStore,
    tiers: StrengthTierTable,
    classifier: SetupClassifier,
    scorer: ConvictionScorer,
    instruments: Vec<String>,
    benchmark: Option<String>,
    bias_band_pct: f64,
    fetch_timeout: Duration,
    last_technicals: HashMap<String, Technicals>,
    cycles: u64,
}

impl ScanOrchestrator {
    pub fn new(cfg: &Config) -> Self {
        Self::with_store(cfg, HistoryStore::new(cfg.retention()))
    }

    pub fn with_store(cfg: &Config, store: HistoryStore) -> Self {
        Self {
            store,
            tiers: cfg.strength_tiers.clone(),
            classifier: SetupClassifier::new(cfg.setup.clone()),
            scorer: ConvictionScorer::new(cfg.conviction.clone()),
            instruments: cfg.instruments.clone(),
            benchmark: cfg.benchmark.clone(),
            bias_band_pct: cfg.bias_band_pct,
            fetch_timeout: cfg.fetch_timeout(),
            last_technicals: HashMap::new(),
            cycles: 0,
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn set_instruments(&mut self, instruments: Vec<String>) {
        self.instruments = instruments;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub async fn run_cycle(&mut self, feed: &mut dyn SnapshotFeed) -> ScanReport {
        self.run_cycle_at(feed, Utc::now()).await
    }

    /// One full pass over the tracked instruments. Per-instrument failures are
    /// recorded as skips and never abort the cycle.
    pub async fn run_cycle_at(
        &mut self,
        feed: &mut dyn SnapshotFeed,
        generated_at: DateTime<Utc>,
    ) -> ScanReport {
        self.cycles += 1;
        let instruments = self.instruments.clone();
        let mut rows = Vec::with_capacity(instruments.len());
        let mut skipped = Vec::new();
        let mut market_bias = None;

        for id in &instruments {
            let fetched = match tokio::time::timeout(self.fetch_timeout, feed.fetch(id)).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(self.fetch_timeout)),
            };

            let fresh = match fetched {
                Ok(obs) => {
                    let day_change = obs.day_change_pct();
                    match self.ingest(obs) {
                        Ok(()) => {
                            if self.benchmark.as_deref() == Some(id.as_str()) {
                                market_bias = day_change.map(|pct| {
                                    MarketBias::from_change_pct(pct, self.bias_band_pct)
                                });
                            }
                            true
                        }
                        Err(e) => {
                            warn!("Rejected snapshot: {}", e);
                            skipped.push(SkippedInstrument {
                                instrument_id: id.clone(),
                                reason: e.to_string(),
                            });
                            false
                        }
                    }
                }
                Err(e) => {
                    debug!("Fetch {} failed: {}", id, e);
                    skipped.push(SkippedInstrument {
                        instrument_id: id.clone(),
                        reason: e.to_string(),
                    });
                    false
                }
            };

            rows.push(self.evaluate(id, !fresh));
        }

        info!(
            "Cycle {}: {} instruments, {} fresh, {} skipped",
            self.cycles,
            instruments.len(),
            instruments.len() - skipped.len(),
            skipped.len()
        );

        ScanReport::new(generated_at, rows, skipped, market_bias)
    }

    /// Validate an observation and append it to history. On rejection the
    /// instrument's window is left untouched.
    pub fn ingest(&mut self, obs: Observation) -> Result<(), ValidationError> {
        let id = obs.instrument_id().to_string();
        validate_snapshot(&obs.snapshot, self.store.last_timestamp(&id))?;
        self.last_technicals.insert(id, obs.technicals);
        self.store.record(obs.snapshot);
        Ok(())
    }

    pub fn trend_metrics(&self, instrument_id: &str) -> TrendMetrics {
        compute_trend_metrics(self.store.get_window(instrument_id), &self.tiers)
    }

    /// Build the output row for an instrument from its retained history.
    /// Without at least two snapshots the row is WEAK, NEUTRAL and scores 0.
    pub fn evaluate(&self, instrument_id: &str, stale: bool) -> ScanRow {
        let window = self.store.get_window(instrument_id);
        let technicals = self
            .last_technicals
            .get(instrument_id)
            .copied()
            .unwrap_or_default();

        let (trend_metrics, setup, conviction_score) = if window.len() < 2 {
            (TrendMetrics::default(), Setup::default(), 0)
        } else {
            let metrics = compute_trend_metrics(window, &self.tiers);
            let setup = self.classifier.classify_with_strength(&metrics, technicals.adx);
            let score = self.scorer.score(&metrics, &technicals);
            (metrics, setup, score)
        };

        let latest = window.last();
        ScanRow {
            instrument_id: instrument_id.to_string(),
            setup,
            conviction_score,
            trend_metrics,
            raw_technicals: technicals,
            last_price: latest.map_or(0.0, |s| s.price),
            open_interest: latest.map_or(0.0, |s| s.open_interest),
            history_len: window.len(),
            stale,
        }
    }
}
