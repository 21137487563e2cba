use crate::config::SetupThresholds;
use crate::core::trend_metrics::TrendMetrics;
use crate::models::{Setup, SetupLabel, StrengthTier};

/// Classify with the default thresholds.
pub fn classify_setup(oi_change_pct: f64, price_change_pct: f64) -> SetupLabel {
    SetupClassifier::default().classify(oi_change_pct, price_change_pct)
}

/// Maps an OI/price change pair onto a market-structure label.
#[derive(Debug, Clone, Default)]
pub struct SetupClassifier {
    thresholds: SetupThresholds,
}

impl SetupClassifier {
    pub fn new(thresholds: SetupThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SetupThresholds {
        &self.thresholds
    }

    /// Total over all inputs: NaN fails every comparison and lands on NEUTRAL.
    pub fn classify(&self, oi_change_pct: f64, price_change_pct: f64) -> SetupLabel {
        let t = &self.thresholds;
        let price_up = price_change_pct > t.price_confirm_pct;
        let price_down = price_change_pct < -t.price_confirm_pct;

        if oi_change_pct > t.oi_change_pct {
            if price_up {
                SetupLabel::LongBuildup
            } else if price_down {
                SetupLabel::ShortBuildup
            } else {
                SetupLabel::OiBuildupNeutral
            }
        } else if oi_change_pct < -t.oi_change_pct {
            if price_up {
                SetupLabel::ShortCovering
            } else if price_down {
                SetupLabel::LongUnwinding
            } else {
                SetupLabel::OiReductionNeutral
            }
        } else if price_change_pct > t.price_only_pct {
            SetupLabel::PriceUpNoOi
        } else if price_change_pct < -t.price_only_pct {
            SetupLabel::PriceDownNoOi
        } else {
            SetupLabel::Neutral
        }
    }

    /// Classify and tag buildups that come with a STRONG OI trend and a trending ADX.
    pub fn classify_with_strength(&self, metrics: &TrendMetrics, adx: f64) -> Setup {
        let label = self.classify(metrics.oi_change_pct, metrics.price_change_pct);
        let strong = label.is_buildup()
            && metrics.strength_tier == StrengthTier::Strong
            && adx > self.thresholds.strong_adx;
        Setup { label, strong }
    }
}
