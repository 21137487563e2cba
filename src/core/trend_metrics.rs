use serde::{Deserialize, Serialize};

use crate::config::StrengthTierTable;
use crate::models::{Snapshot, StrengthTier};

/// Reduction of one instrument's history window. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetrics {
    pub oi_change_pct: f64,
    pub duration_minutes: f64,
    pub oi_acceleration_pct: f64,
    pub price_change_pct: f64,
    pub avg_oi: f64,
    pub strength_tier: StrengthTier,
}

/// Compute trend metrics over a window ordered oldest first.
///
/// Fewer than two snapshots yields all zeros and WEAK. Zero denominators
/// produce zero rather than an error.
pub fn compute_trend_metrics(window: &[Snapshot], tiers: &StrengthTierTable) -> TrendMetrics {
    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= 2 => (first, last),
        _ => return TrendMetrics::default(),
    };

    let oi_change_pct = pct_change(first.open_interest, last.open_interest);
    let price_change_pct = pct_change(first.price, last.price);
    let duration_minutes =
        (last.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0;
    let avg_oi = mean_oi(window);

    TrendMetrics {
        oi_change_pct,
        duration_minutes,
        oi_acceleration_pct: oi_acceleration(window),
        price_change_pct,
        avg_oi,
        strength_tier: strength_tier(duration_minutes, oi_change_pct, tiers),
    }
}

/// Late-half average OI versus early-half average, split at `len / 2`.
pub fn oi_acceleration(window: &[Snapshot]) -> f64 {
    if window.len() < 3 {
        return 0.0;
    }
    let (early, late) = window.split_at(window.len() / 2);
    pct_change(mean_oi(early), mean_oi(late))
}

/// First rule whose duration and |OI change| thresholds are both met.
pub fn strength_tier(
    duration_minutes: f64,
    oi_change_pct: f64,
    tiers: &StrengthTierTable,
) -> StrengthTier {
    let magnitude = oi_change_pct.abs();
    tiers
        .rules
        .iter()
        .find(|r| {
            duration_minutes >= r.min_duration_minutes && magnitude > r.min_abs_oi_change_pct
        })
        .map_or(StrengthTier::Weak, |r| r.tier)
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

fn mean_oi(snapshots: &[Snapshot]) -> f64 {
    if snapshots.is_empty() {
        return 0.0;
    }
    snapshots.iter().map(|s| s.open_interest).sum::<f64>() / snapshots.len() as f64
}
