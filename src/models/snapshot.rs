use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of one instrument. Immutable once handed to the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub instrument_id: String,
    pub timestamp: DateTime<Utc>,
    pub open_interest: f64,
    pub price: f64,
}

impl Snapshot {
    pub fn new(
        instrument_id: &str,
        timestamp: DateTime<Utc>,
        open_interest: f64,
        price: f64,
    ) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            timestamp,
            open_interest,
            price,
        }
    }
}

/// Indicator values computed outside the engine and handed in with each snapshot.
/// A zero value means "not available" and scores nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Technicals {
    #[serde(default)]
    pub rsi: f64,
    #[serde(default)]
    pub adx: f64,
    #[serde(default)]
    pub volume_ratio: f64,
    #[serde(default)]
    pub momentum_pct: f64,
    #[serde(default)]
    pub sma: f64,
}

/// Everything the feed produces for one instrument in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub snapshot: Snapshot,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub technicals: Technicals,
    /// Previous session close, used for the benchmark bias readout.
    #[serde(default)]
    pub prev_close: Option<f64>,
}

impl Observation {
    pub fn new(snapshot: Snapshot, technicals: Technicals) -> Self {
        Self {
            snapshot,
            volume: 0.0,
            technicals,
            prev_close: None,
        }
    }

    pub fn instrument_id(&self) -> &str {
        &self.snapshot.instrument_id
    }

    /// Percent change of the last price versus the previous close.
    pub fn day_change_pct(&self) -> Option<f64> {
        match self.prev_close {
            Some(prev) if prev > 0.0 => Some((self.snapshot.price - prev) / prev * 100.0),
            _ => None,
        }
    }
}
