mod bot;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use oi_scanner::config::Config;
use oi_scanner::feed::HttpFeed;

use crate::bot::OiScanner;

#[tokio::main]
async fn main() -> Result<()> {
    let mut cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    if let Some(path) = cfg.thresholds_file.clone() {
        cfg.apply_threshold_file(&path)?;
    }

    let feed = Box::new(HttpFeed::new(&cfg));
    let shared_config = cfg.shared();

    let mut scanner = OiScanner::new(shared_config, feed).await;
    scanner.run().await?;

    Ok(())
}
