use serde::{Deserialize, Serialize};

use crate::config::{ConvictionTable, PointBucket};
use crate::core::trend_metrics::TrendMetrics;
use crate::models::Technicals;

pub const MAX_SCORE: u32 = 100;

/// Points awarded per factor group, before clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvictionBreakdown {
    pub strength: u32,
    pub acceleration: u32,
    pub magnitude: u32,
    pub duration: u32,
    pub rsi: u32,
    pub adx: u32,
    pub volume: u32,
}

impl ConvictionBreakdown {
    pub fn raw_total(&self) -> u32 {
        self.strength
            .saturating_add(self.acceleration)
            .saturating_add(self.magnitude)
            .saturating_add(self.duration)
            .saturating_add(self.rsi)
            .saturating_add(self.adx)
            .saturating_add(self.volume)
    }

    pub fn score(&self) -> u32 {
        self.raw_total().min(MAX_SCORE)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvictionScorer {
    table: ConvictionTable,
}

impl ConvictionScorer {
    pub fn new(table: ConvictionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ConvictionTable {
        &self.table
    }

    /// Bounded 0..=100 score.
    pub fn score(&self, metrics: &TrendMetrics, technicals: &Technicals) -> u32 {
        self.breakdown(metrics, technicals).score()
    }

    pub fn breakdown(&self, metrics: &TrendMetrics, technicals: &Technicals) -> ConvictionBreakdown {
        let t = &self.table;
        let rsi = technicals.rsi;
        ConvictionBreakdown {
            strength: t.strength.for_tier(metrics.strength_tier),
            acceleration: best_bucket(&t.acceleration, metrics.oi_acceleration_pct.abs()),
            magnitude: best_bucket(&t.magnitude, metrics.oi_change_pct.abs()),
            duration: best_bucket(&t.duration, metrics.duration_minutes),
            rsi: if rsi > t.rsi.lower && rsi < t.rsi.upper {
                t.rsi.points
            } else {
                0
            },
            adx: best_bucket(std::slice::from_ref(&t.adx), technicals.adx),
            volume: best_bucket(&t.volume_ratio, technicals.volume_ratio),
        }
    }
}

/// Highest points among buckets the value strictly exceeds; 0 when none do.
fn best_bucket(buckets: &[PointBucket], value: f64) -> u32 {
    buckets
        .iter()
        .filter(|b| value > b.above)
        .map(|b| b.points)
        .max()
        .unwrap_or(0)
}

/// Score with the default point table.
pub fn conviction_score(metrics: &TrendMetrics, technicals: &Technicals) -> u32 {
    ConvictionScorer::default().score(metrics, technicals)
}
