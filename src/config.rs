use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::StrengthTier;

pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthTierRule {
    pub tier: StrengthTier,
    pub min_duration_minutes: f64,
    pub min_abs_oi_change_pct: f64,
}

/// Ordered rules, first match wins. Anything unmatched is WEAK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthTierTable {
    pub rules: Vec<StrengthTierRule>,
}

impl Default for StrengthTierTable {
    fn default() -> Self {
        let rule = |tier, min_duration_minutes, min_abs_oi_change_pct| StrengthTierRule {
            tier,
            min_duration_minutes,
            min_abs_oi_change_pct,
        };
        Self {
            rules: vec![
                rule(StrengthTier::Strong, 120.0, 5.0),
                rule(StrengthTier::Moderate, 60.0, 3.0),
                rule(StrengthTier::Building, 30.0, 1.5),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupThresholds {
    /// |OI change| beyond this counts as a buildup or a reduction.
    pub oi_change_pct: f64,
    /// Price move that confirms an OI-driven setup.
    pub price_confirm_pct: f64,
    /// Price move that flags a move without OI participation.
    pub price_only_pct: f64,
    /// ADX above which a STRONG buildup gets the strong tag.
    pub strong_adx: f64,
}

impl Default for SetupThresholds {
    fn default() -> Self {
        Self {
            oi_change_pct: 2.0,
            price_confirm_pct: 0.5,
            price_only_pct: 1.0,
            strong_adx: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointBucket {
    pub above: f64,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierPoints {
    pub strong: u32,
    pub moderate: u32,
    pub building: u32,
    pub weak: u32,
}

impl TierPoints {
    pub fn for_tier(&self, tier: StrengthTier) -> u32 {
        match tier {
            StrengthTier::Strong => self.strong,
            StrengthTier::Moderate => self.moderate,
            StrengthTier::Building => self.building,
            StrengthTier::Weak => self.weak,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiBand {
    pub lower: f64,
    pub upper: f64,
    pub points: u32,
}

/// Point buckets for the conviction score. Within a group only the best
/// matching bucket counts; groups add up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvictionTable {
    pub strength: TierPoints,
    pub acceleration: Vec<PointBucket>,
    pub magnitude: Vec<PointBucket>,
    pub duration: Vec<PointBucket>,
    pub rsi: RsiBand,
    pub adx: PointBucket,
    pub volume_ratio: Vec<PointBucket>,
}

impl Default for ConvictionTable {
    fn default() -> Self {
        let b = |above, points| PointBucket { above, points };
        Self {
            strength: TierPoints {
                strong: 30,
                moderate: 20,
                building: 10,
                weak: 0,
            },
            acceleration: vec![b(5.0, 15), b(2.0, 8)],
            magnitude: vec![b(8.0, 15), b(5.0, 10), b(2.0, 5)],
            duration: vec![b(120.0, 10), b(60.0, 7), b(30.0, 4)],
            rsi: RsiBand {
                lower: 40.0,
                upper: 65.0,
                points: 10,
            },
            adx: b(25.0, 10),
            volume_ratio: vec![b(1.5, 10), b(1.2, 5)],
        }
    }
}

/// Optional JSON file contents; any table left out keeps its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub strength_tiers: Option<StrengthTierTable>,
    #[serde(default)]
    pub setup: Option<SetupThresholds>,
    #[serde(default)]
    pub conviction: Option<ConvictionTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketHoursConfig {
    pub open: (u32, u32),
    pub close: (u32, u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Feed
    pub feed_base_url: String,
    pub feed_client_id: String,
    pub feed_access_token: String,
    pub instruments: Vec<String>,
    pub benchmark: Option<String>,

    // Scheduling
    pub scan_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub market_hours_only: bool,
    pub market_hours: MarketHoursConfig,

    // History
    pub retention_minutes: i64,

    // Thresholds
    pub strength_tiers: StrengthTierTable,
    pub setup: SetupThresholds,
    pub conviction: ConvictionTable,
    pub bias_band_pct: f64,

    // Output
    pub top_n: usize,
    pub min_alert_score: u32,
    pub thresholds_file: Option<String>,
    pub report_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let optional = |key: &str| -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        };

        let instruments: Vec<String> = env(
            "INSTRUMENTS",
            "NIFTY,BANKNIFTY,RELIANCE,HDFCBANK,ICICIBANK,INFY,TCS,SBIN",
        )
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

        Config {
            feed_base_url: env("FEED_BASE_URL", "http://127.0.0.1:8080"),
            feed_client_id: env("FEED_CLIENT_ID", ""),
            feed_access_token: env("FEED_ACCESS_TOKEN", ""),
            instruments,
            benchmark: Some(env("BENCHMARK", "NIFTY")).filter(|s| !s.is_empty()),
            scan_interval_secs: env("SCAN_INTERVAL_SECS", "180").parse().unwrap_or(180),
            fetch_timeout_secs: env("FETCH_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            market_hours_only: env("MARKET_HOURS_ONLY", "true").to_lowercase() == "true",
            market_hours: MarketHoursConfig {
                open: (9, 15),
                close: (15, 30),
            },
            retention_minutes: env("OI_RETENTION_MINUTES", "360").parse().unwrap_or(360),
            strength_tiers: StrengthTierTable::default(),
            setup: SetupThresholds::default(),
            conviction: ConvictionTable::default(),
            bias_band_pct: 0.25,
            top_n: env("TOP_N", "10").parse().unwrap_or(10),
            min_alert_score: env("MIN_ALERT_SCORE", "60").parse().unwrap_or(60),
            thresholds_file: optional("THRESHOLDS_FILE"),
            report_dir: env("REPORT_DIR", "reports"),
            log_level: env("LOG_LEVEL", "INFO"),
        }
    }

    /// Replace threshold tables with the ones present in a JSON file.
    pub fn apply_threshold_file(&mut self, path: &str) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read thresholds file {}", path))?;
        let overrides: ThresholdOverrides = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse thresholds file {}", path))?;
        self.apply_overrides(overrides);
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ThresholdOverrides) {
        if let Some(tiers) = overrides.strength_tiers {
            self.strength_tiers = tiers;
        }
        if let Some(setup) = overrides.setup {
            self.setup = setup;
        }
        if let Some(conviction) = overrides.conviction {
            self.conviction = conviction;
        }
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.retention_minutes.max(1))
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}
