use anyhow::{bail, Context, Result};
use chrono::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use oi_scanner::config::Config;
use oi_scanner::feed::ReplayFeed;
use oi_scanner::scanner::{ScanOrchestrator, ScanReport};

#[tokio::main]
async fn main() -> Result<()> {
    let mut cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    if let Some(path) = cfg.thresholds_file.clone() {
        cfg.apply_threshold_file(&path)?;
    }

    // Parse CLI args: <replay.json> [step_minutes]
    let args: Vec<String> = std::env::args().collect();
    let path = match args.get(1) {
        Some(p) => p.clone(),
        None => bail!("usage: replay <observations.json> [step_minutes]"),
    };
    let step_minutes: i64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3)
        .max(1);

    let mut feed = ReplayFeed::load_file(&path)?;
    let (start, end) = match (feed.earliest_time(), feed.latest_time()) {
        (Some(s), Some(e)) => (s, e),
        _ => bail!("replay file {} has no observations", path),
    };

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          OI TREND SCANNER — REPLAY                      ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!("  File:        {}", path);
    println!("  Instruments: {}", feed.instruments().len());
    println!(
        "  Period:      {} to {}",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    );
    println!("  Step:        {} minutes", step_minutes);
    println!();

    let mut orchestrator = ScanOrchestrator::new(&cfg);
    orchestrator.set_instruments(feed.instruments());

    let step = Duration::minutes(step_minutes);
    let mut t = start;
    let mut last_report: Option<ScanReport> = None;
    while t <= end + step {
        feed.set_time(t);
        let report = orchestrator.run_cycle_at(&mut feed, t).await;
        let alerts = report.high_conviction(cfg.min_alert_score).len();
        if alerts > 0 {
            info!("{}: {} high-conviction setups", t.format("%H:%M"), alerts);
        }
        last_report = Some(report);
        t += step;
    }

    let report = match last_report {
        Some(r) => r,
        None => bail!("no scan cycles ran"),
    };

    let summary = report.summary_text(cfg.top_n, cfg.min_alert_score);
    println!("{}", summary);

    let saved = save_report(&report, &summary, &cfg.report_dir)?;
    println!("Report saved to: {}", saved);

    Ok(())
}

fn save_report(report: &ScanReport, summary: &str, dir: &str) -> Result<String> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir))?;
    let stem = format!("{}/oi_scan_{}", dir, report.generated_at.format("%Y%m%d_%H%M"));

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(format!("{}.json", stem), json)?;
    std::fs::write(format!("{}.txt", stem), summary)?;

    Ok(format!("{}.json", stem))
}
