use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::trend_metrics::TrendMetrics;
use crate::models::{Lean, MarketBias, Setup, SetupLabel, Technicals};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRow {
    pub instrument_id: String,
    pub setup: Setup,
    pub conviction_score: u32,
    pub trend_metrics: TrendMetrics,
    pub raw_technicals: Technicals,
    pub last_price: f64,
    pub open_interest: f64,
    pub history_len: usize,
    /// True when this cycle's fetch failed and the row comes from retained history.
    pub stale: bool,
}

impl ScanRow {
    pub fn lean(&self) -> Lean {
        self.setup.label.lean()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedInstrument {
    pub instrument_id: String,
    pub reason: String,
}

/// Output of one scan cycle, rows ranked by conviction (highest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ScanRow>,
    pub skipped: Vec<SkippedInstrument>,
    pub market_bias: Option<MarketBias>,
}

impl ScanReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        mut rows: Vec<ScanRow>,
        skipped: Vec<SkippedInstrument>,
        market_bias: Option<MarketBias>,
    ) -> Self {
        rows.sort_by(|a, b| {
            b.conviction_score
                .cmp(&a.conviction_score)
                .then_with(|| a.instrument_id.cmp(&b.instrument_id))
        });
        Self {
            generated_at,
            rows,
            skipped,
            market_bias,
        }
    }

    pub fn bullish(&self, top_n: usize) -> Vec<&ScanRow> {
        self.by_lean(Lean::Bullish, top_n)
    }

    pub fn bearish(&self, top_n: usize) -> Vec<&ScanRow> {
        self.by_lean(Lean::Bearish, top_n)
    }

    fn by_lean(&self, lean: Lean, top_n: usize) -> Vec<&ScanRow> {
        self.rows
            .iter()
            .filter(|r| r.lean() == lean)
            .take(top_n)
            .collect()
    }

    /// Rows that pass the alert gate: a fresh OI-driven setup with enough conviction.
    pub fn high_conviction(&self, min_score: u32) -> Vec<&ScanRow> {
        self.rows
            .iter()
            .filter(|r| {
                !r.stale && r.setup.label.is_oi_driven() && r.conviction_score >= min_score
            })
            .collect()
    }

    /// Rows whose OI moved past the buildup threshold in either direction.
    pub fn oi_movers(&self, oi_threshold_pct: f64) -> Vec<&ScanRow> {
        self.rows
            .iter()
            .filter(|r| r.trend_metrics.oi_change_pct.abs() > oi_threshold_pct)
            .collect()
    }

    pub fn row(&self, instrument_id: &str) -> Option<&ScanRow> {
        self.rows.iter().find(|r| r.instrument_id == instrument_id)
    }

    pub fn count_label(&self, label: SetupLabel) -> usize {
        self.rows.iter().filter(|r| r.setup.label == label).count()
    }

    pub fn log_dashboard(&self, top_n: usize, min_alert_score: u32) {
        info!("{}", "=".repeat(72));
        info!(
            "OI scan @ {} | {} rows | {} skipped | bias {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.rows.len(),
            self.skipped.len(),
            self.market_bias
                .map(|b| b.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );

        let alerts = self.high_conviction(min_alert_score);
        info!("--- High conviction (score >= {}) ---", min_alert_score);
        for row in &alerts {
            info!("  {}", format_row(row));
        }
        if alerts.is_empty() {
            info!("  none");
        }

        info!("--- Bullish top {} ---", top_n);
        for row in self.bullish(top_n) {
            info!("  {}", format_row(row));
        }
        info!("--- Bearish top {} ---", top_n);
        for row in self.bearish(top_n) {
            info!("  {}", format_row(row));
        }
        info!("{}", "=".repeat(72));
    }

    pub fn summary_text(&self, top_n: usize, min_alert_score: u32) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "OI Scan Report {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(bias) = self.market_bias {
            out.push_str(&format!("Market bias: {}\n", bias));
        }
        out.push_str(&format!(
            "Rows: {}  Skipped: {}\n\n",
            self.rows.len(),
            self.skipped.len()
        ));

        let sections: [(&str, Vec<&ScanRow>); 3] = [
            ("High conviction", self.high_conviction(min_alert_score)),
            ("Bullish", self.bullish(top_n)),
            ("Bearish", self.bearish(top_n)),
        ];
        for (title, rows) in sections {
            out.push_str(&format!("{}:\n", title));
            for row in rows {
                out.push_str(&format!("  {}\n", format_row(row)));
            }
            out.push('\n');
        }

        if !self.skipped.is_empty() {
            out.push_str("Skipped:\n");
            for s in &self.skipped {
                out.push_str(&format!("  {}: {}\n", s.instrument_id, s.reason));
            }
        }
        out
    }
}

fn format_row(row: &ScanRow) -> String {
    let m = &row.trend_metrics;
    format!(
        "{:<12} {:>3} {:<28} OI {:+6.2}% px {:+6.2}% acc {:+6.2}% {:>4.0}m {:<8}{}",
        row.instrument_id,
        row.conviction_score,
        row.setup.to_string(),
        m.oi_change_pct,
        m.price_change_pct,
        m.oi_acceleration_pct,
        m.duration_minutes,
        m.strength_tier,
        if row.stale { " (stale)" } else { "" }
    )
}
