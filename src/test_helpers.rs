use chrono::{DateTime, Duration, Utc};

use crate::config::{
    Config, ConvictionTable, MarketHoursConfig, SetupThresholds, StrengthTierTable,
};
use crate::models::{Observation, Snapshot, Technicals};

/// 2024-01-15 09:30 IST.
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T04:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Snapshot `minutes` after `base_time()`.
pub fn snap(id: &str, minutes: i64, oi: f64, price: f64) -> Snapshot {
    Snapshot::new(id, base_time() + Duration::minutes(minutes), oi, price)
}

/// Build an ordered window from (minutes, oi, price) tuples.
pub fn window(id: &str, points: &[(i64, f64, f64)]) -> Vec<Snapshot> {
    points
        .iter()
        .map(|&(m, oi, price)| snap(id, m, oi, price))
        .collect()
}

pub fn observation(id: &str, minutes: i64, oi: f64, price: f64) -> Observation {
    Observation::new(snap(id, minutes, oi, price), Technicals::default())
}

/// A Config suitable for testing — no feed credentials, no threshold file.
pub fn default_test_config() -> Config {
    Config {
        feed_base_url: "http://127.0.0.1:0".to_string(),
        feed_client_id: String::new(),
        feed_access_token: String::new(),
        instruments: vec!["NIFTY".to_string(), "SBIN".to_string(), "TCS".to_string()],
        benchmark: Some("NIFTY".to_string()),
        scan_interval_secs: 180,
        fetch_timeout_secs: 5,
        market_hours_only: false,
        market_hours: MarketHoursConfig {
            open: (9, 15),
            close: (15, 30),
        },
        retention_minutes: 360,
        strength_tiers: StrengthTierTable::default(),
        setup: SetupThresholds::default(),
        conviction: ConvictionTable::default(),
        bias_band_pct: 0.25,
        top_n: 10,
        min_alert_score: 60,
        thresholds_file: None,
        report_dir: std::env::temp_dir()
            .join("oi_scanner_test_reports")
            .to_string_lossy()
            .to_string(),
        log_level: "INFO".to_string(),
    }
}
