mod common;

use common::*;
use oi_scanner::core::trend_metrics::TrendMetrics;
use oi_scanner::core::{classify_setup, compute_trend_metrics, conviction_score, HistoryStore};
use oi_scanner::feed::replay::ReplayRecord;
use oi_scanner::feed::{FeedError, ReplayFeed};
use oi_scanner::models::{MarketBias, SetupLabel, StrengthTier, Technicals};
use oi_scanner::scanner::ScanOrchestrator;

#[test]
fn two_point_window_scenario() {
    let mut store = HistoryStore::default();
    store.record(snap("RELIANCE", 0, 1000.0, 100.0));
    store.record(snap("RELIANCE", 65, 1100.0, 102.0));

    let m = compute_trend_metrics(store.get_window("RELIANCE"), &Default::default());
    assert!((m.oi_change_pct - 10.0).abs() < 1e-9);
    assert!((m.duration_minutes - 65.0).abs() < 1e-9);
    assert_eq!(m.strength_tier, StrengthTier::Moderate);
    assert!((m.price_change_pct - 2.0).abs() < 1e-9);
    assert_eq!(classify_setup(m.oi_change_pct, m.price_change_pct), SetupLabel::LongBuildup);
}

#[test]
fn covering_scenario() {
    assert_eq!(classify_setup(-5.0, 1.5), SetupLabel::ShortCovering);
}

#[test]
fn empty_window_scenario() {
    let m = compute_trend_metrics(&[], &Default::default());
    assert_eq!(m.oi_change_pct, 0.0);
    assert_eq!(m.duration_minutes, 0.0);
    assert_eq!(m.oi_acceleration_pct, 0.0);
    assert_eq!(m.price_change_pct, 0.0);
    assert_eq!(m.strength_tier, StrengthTier::Weak);
}

#[test]
fn full_score_scenario() {
    let m = TrendMetrics {
        strength_tier: StrengthTier::Strong,
        oi_acceleration_pct: 6.0,
        oi_change_pct: 9.0,
        duration_minutes: 130.0,
        ..Default::default()
    };
    assert_eq!(conviction_score(&m, &technicals(50.0, 30.0, 1.6)), 100);
}

#[tokio::test]
async fn negative_oi_rejected_and_window_unchanged() {
    let cfg = test_config(&["SBIN"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    feed.push_ok(obs("SBIN", 0, 1000.0, 600.0, Technicals::default()));
    feed.push_ok(obs("SBIN", 3, -1.0, 601.0, Technicals::default()));

    let first = orch.run_cycle_at(&mut feed, base_time()).await;
    assert!(first.skipped.is_empty());
    assert_eq!(orch.store().len("SBIN"), 1);

    let second = orch.run_cycle_at(&mut feed, base_time()).await;
    assert_eq!(second.skipped.len(), 1);
    assert!(second.skipped[0].reason.contains("negative open interest"));
    assert_eq!(orch.store().len("SBIN"), 1);
    assert!(second.row("SBIN").unwrap().stale);
}

#[tokio::test]
async fn fetch_failure_skips_instrument_but_cycle_completes() {
    let cfg = test_config(&["NIFTY", "SBIN", "TCS"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();

    let t = technicals(55.0, 30.0, 1.6);
    feed.push_ok(obs("SBIN", 0, 1000.0, 100.0, t));
    feed.push_ok(obs("TCS", 0, 2000.0, 3500.0, t));
    orch.run_cycle_at(&mut feed, base_time()).await;

    feed.push_ok(obs("SBIN", 130, 1100.0, 102.0, t));
    feed.push_err("TCS", FeedError::Transport("connection reset".into()));
    let report = orch.run_cycle_at(&mut feed, base_time()).await;

    // every tracked instrument still renders
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.skipped.len(), 2); // TCS failed, NIFTY has no data

    let sbin = report.row("SBIN").unwrap();
    assert!(!sbin.stale);
    assert_eq!(sbin.setup.label, SetupLabel::LongBuildup);
    assert!(sbin.setup.strong);
    assert_eq!(sbin.trend_metrics.strength_tier, StrengthTier::Strong);
    // STRONG 30 + magnitude 15 + duration 10 + rsi 10 + adx 10 + volume 10
    assert_eq!(sbin.conviction_score, 85);

    let tcs = report.row("TCS").unwrap();
    assert!(tcs.stale);
    assert_eq!(tcs.history_len, 1);
    assert_eq!(tcs.conviction_score, 0);

    let nifty = report.row("NIFTY").unwrap();
    assert_eq!(nifty.setup.label, SetupLabel::Neutral);
    assert_eq!(nifty.trend_metrics.strength_tier, StrengthTier::Weak);
    assert_eq!(nifty.conviction_score, 0);

    assert_eq!(report.rows[0].instrument_id, "SBIN");
    assert_eq!(report.bullish(5).len(), 1);
    assert!(report.bearish(5).is_empty());
    assert_eq!(report.high_conviction(60).len(), 1);
}

#[tokio::test]
async fn timed_out_fetch_is_skipped() {
    let cfg = test_config(&["SBIN", "TCS"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut inner = ScriptedFeed::new();
    inner.push_ok(obs("TCS", 0, 2000.0, 3500.0, Technicals::default()));
    inner.push_ok(obs("SBIN", 0, 1000.0, 600.0, Technicals::default()));
    let mut feed = StallingFeed {
        inner,
        stalled: "SBIN".to_string(),
    };

    let report = orch.run_cycle_at(&mut feed, base_time()).await;
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].instrument_id, "SBIN");
    assert!(report.skipped[0].reason.contains("timed out"));
    assert_eq!(orch.store().len("SBIN"), 0);
    assert_eq!(orch.store().len("TCS"), 1);
}

#[tokio::test]
async fn benchmark_sets_market_bias() {
    let cfg = test_config(&["NIFTY"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    let mut o = obs("NIFTY", 0, 0.0, 22100.0, Technicals::default());
    o.prev_close = Some(22000.0);
    feed.push_ok(o);

    let report = orch.run_cycle_at(&mut feed, base_time()).await;
    assert_eq!(report.market_bias, Some(MarketBias::Bullish));
}

#[tokio::test]
async fn short_buildup_ranks_bearish() {
    let cfg = test_config(&["SBIN", "TCS"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    let t = technicals(45.0, 20.0, 1.3);

    feed.push_ok(obs("SBIN", 0, 1000.0, 600.0, t));
    feed.push_ok(obs("TCS", 0, 2000.0, 3500.0, t));
    orch.run_cycle_at(&mut feed, base_time()).await;

    feed.push_ok(obs("SBIN", 70, 1060.0, 590.0, t)); // +6% OI, -1.67% price
    feed.push_ok(obs("TCS", 70, 1900.0, 3450.0, t)); // -5% OI, -1.43% price
    let report = orch.run_cycle_at(&mut feed, base_time()).await;

    assert_eq!(report.row("SBIN").unwrap().setup.label, SetupLabel::ShortBuildup);
    assert_eq!(report.row("TCS").unwrap().setup.label, SetupLabel::LongUnwinding);
    let bears: Vec<&str> = report
        .bearish(10)
        .iter()
        .map(|r| r.instrument_id.as_str())
        .collect();
    assert_eq!(bears.len(), 2);
    // SBIN: MODERATE 20 + magnitude 10 + duration 7 + rsi 10 + volume 5 = 52
    assert_eq!(report.row("SBIN").unwrap().conviction_score, 52);
    // TCS: MODERATE 20 + magnitude 5 + duration 7 + rsi 10 + volume 5 = 47
    assert_eq!(report.row("TCS").unwrap().conviction_score, 47);
    assert_eq!(bears, vec!["SBIN", "TCS"]);
}

#[tokio::test]
async fn replay_feed_drives_cycles() {
    let records: Vec<ReplayRecord> = (0..5)
        .map(|i| ReplayRecord {
            instrument_id: "HDFCBANK".to_string(),
            timestamp: base_time() + chrono::Duration::minutes(i * 30),
            price: 1500.0 + i as f64 * 5.0,
            open_interest: 10_000.0 + i as f64 * 300.0,
            volume: 0.0,
            prev_close: None,
            technicals: technicals(55.0, 28.0, 1.3),
        })
        .collect();
    let mut feed = ReplayFeed::from_records(records);

    let mut cfg = test_config(&[]);
    cfg.instruments = feed.instruments();
    let mut orch = ScanOrchestrator::new(&cfg);

    let mut last = None;
    for i in 0..5 {
        let t = base_time() + chrono::Duration::minutes(i * 30);
        feed.set_time(t);
        last = Some(orch.run_cycle_at(&mut feed, t).await);
    }
    let report = last.unwrap();
    let row = report.row("HDFCBANK").unwrap();
    assert_eq!(row.history_len, 5);
    // +12% OI over 120 minutes with price up ~1.33%
    assert_eq!(row.setup.label, SetupLabel::LongBuildup);
    assert_eq!(row.trend_metrics.strength_tier, StrengthTier::Strong);
    assert!(row.setup.strong);
    assert!(row.trend_metrics.oi_acceleration_pct > 5.0);
}

#[tokio::test]
async fn retention_bounds_history_across_cycles() {
    let mut cfg = test_config(&["SBIN"]);
    cfg.retention_minutes = 60;
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    for i in 0..10 {
        feed.push_ok(obs("SBIN", i * 20, 1000.0 + i as f64, 600.0, Technicals::default()));
        orch.run_cycle_at(&mut feed, base_time()).await;
    }
    let window = orch.store().get_window("SBIN");
    assert_eq!(window.len(), 4); // 120, 140, 160, 180
    let newest = window.last().unwrap().timestamp;
    assert!(window
        .iter()
        .all(|s| newest - s.timestamp <= chrono::Duration::minutes(60)));
}

#[tokio::test]
async fn dead_feed_keeps_row_but_drops_alert() {
    let cfg = test_config(&["SBIN"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    let t = technicals(55.0, 30.0, 1.6);

    feed.push_ok(obs("SBIN", 0, 1000.0, 100.0, t));
    orch.run_cycle_at(&mut feed, base_time()).await;
    feed.push_ok(obs("SBIN", 130, 1100.0, 102.0, t));
    let live = orch.run_cycle_at(&mut feed, base_time()).await;
    assert_eq!(live.high_conviction(60).len(), 1);

    for _ in 0..5 {
        feed.push_err("SBIN", FeedError::Transport("connection reset".into()));
    }
    for _ in 0..5 {
        let report = orch.run_cycle_at(&mut feed, base_time()).await;
        let row = report.row("SBIN").unwrap();
        assert!(row.stale);
        assert_eq!(row.conviction_score, 85);
        assert_eq!(report.rows.len(), 1);
        assert!(report.high_conviction(60).is_empty());
    }
}

#[tokio::test]
async fn rejected_benchmark_leaves_bias_unset() {
    let cfg = test_config(&["NIFTY"]);
    let mut orch = ScanOrchestrator::new(&cfg);
    let mut feed = ScriptedFeed::new();
    let mut o = obs("NIFTY", 0, -5.0, 22100.0, Technicals::default());
    o.prev_close = Some(22000.0);
    feed.push_ok(o);

    let report = orch.run_cycle_at(&mut feed, base_time()).await;
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.market_bias, None);
    assert_eq!(orch.store().len("NIFTY"), 0);
}
