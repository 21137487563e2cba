use anyhow::Result;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

use oi_scanner::config::SharedConfig;
use oi_scanner::core::market_hours::MarketHours;
use oi_scanner::feed::SnapshotFeed;
use oi_scanner::scanner::{ScanOrchestrator, ScanReport};

const CLOSED_MARKET_LOG_INTERVAL: f64 = 900.0;

pub struct OiScanner {
    config: SharedConfig,
    feed: Box<dyn SnapshotFeed>,
    orchestrator: ScanOrchestrator,
    market_hours: MarketHours,

    last_scan: Option<Instant>,
    last_closed_log: Option<Instant>,
    last_report: Option<ScanReport>,
}

impl OiScanner {
    pub async fn new(config: SharedConfig, feed: Box<dyn SnapshotFeed>) -> Self {
        let cfg = config.read().await;

        info!("{}", "=".repeat(60));
        info!("OI trend scanner starting up");
        info!("Instruments: {}", cfg.instruments.join(", "));
        info!(
            "Scan every {}s | fetch timeout {}s | retention {}m",
            cfg.scan_interval_secs, cfg.fetch_timeout_secs, cfg.retention_minutes
        );
        for rule in &cfg.strength_tiers.rules {
            info!(
                "  {}: >= {}m and |OI| > {}%",
                rule.tier, rule.min_duration_minutes, rule.min_abs_oi_change_pct
            );
        }
        info!("{}", "=".repeat(60));

        let orchestrator = ScanOrchestrator::new(&cfg);
        let market_hours = MarketHours::new(&cfg);

        drop(cfg);

        Self {
            config,
            feed,
            orchestrator,
            market_hours,
            last_scan: None,
            last_closed_log: None,
            last_report: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Scanner is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown().await;
                    return Ok(());
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&mut self) {
        let cfg = self.config.read().await.clone();
        let now = Utc::now();

        if cfg.market_hours_only && !self.market_hours.is_open(now) {
            let due = self
                .last_closed_log
                .map_or(true, |t| t.elapsed().as_secs_f64() > CLOSED_MARKET_LOG_INTERVAL);
            if due {
                info!(
                    "Market closed ({}), waiting",
                    MarketHours::local_time_label(now)
                );
                self.last_closed_log = Some(Instant::now());
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            return;
        }

        let due = self
            .last_scan
            .map_or(true, |t| t.elapsed().as_secs() >= cfg.scan_interval_secs);
        if due {
            let started = Instant::now();
            let report = self.orchestrator.run_cycle(&mut *self.feed).await;
            debug!("Cycle took {:.1}s", started.elapsed().as_secs_f64());
            report.log_dashboard(cfg.top_n, cfg.min_alert_score);
            self.last_report = Some(report);
            self.last_scan = Some(Instant::now());
        }

        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    }

    async fn shutdown(&self) {
        let min_alert_score = self.config.read().await.min_alert_score;
        info!("Shutting down after {} cycles", self.orchestrator.cycles());
        if let Some(report) = &self.last_report {
            info!(
                "Last cycle: {} rows, {} high-conviction",
                report.rows.len(),
                report.high_conviction(min_alert_score).len()
            );
        }
        info!(
            "Tracked history for {} instruments",
            self.orchestrator.store().instrument_count()
        );
    }
}
