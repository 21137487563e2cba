use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::feed::{FeedError, SnapshotFeed};
use crate::models::{Observation, Snapshot, Technicals};

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

/// Wire shape of `GET {base}/v1/snapshot/{instrument}`.
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    instrument_id: Option<String>,
    /// Unix seconds.
    timestamp: i64,
    ltp: f64,
    open_interest: f64,
    #[serde(default)]
    volume: f64,
    #[serde(default)]
    rsi: f64,
    #[serde(default)]
    adx: f64,
    #[serde(default)]
    volume_ratio: f64,
    #[serde(default)]
    momentum_pct: f64,
    #[serde(default)]
    sma: f64,
    #[serde(default)]
    prev_close: Option<f64>,
}

pub struct HttpFeed {
    client: Client,
    base_url: String,
    client_id: String,
    access_token: String,
    timeout: Duration,
    last_request: Option<Instant>,
}

impl HttpFeed {
    pub fn new(cfg: &Config) -> Self {
        let timeout = cfg.fetch_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: cfg.feed_base_url.trim_end_matches('/').to_string(),
            client_id: cfg.feed_client_id.clone(),
            access_token: cfg.feed_access_token.clone(),
            timeout,
            last_request: None,
        }
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    pub async fn fetch_snapshot(&mut self, instrument_id: &str) -> Result<Observation, FeedError> {
        self.rate_limit().await;

        let url = format!("{}/v1/snapshot/{}", self.base_url, instrument_id);
        let resp = self
            .client
            .get(&url)
            .header("client-id", &self.client_id)
            .header("access-token", &self.access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout(self.timeout)
                } else {
                    FeedError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(instrument_id.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        parse_snapshot(instrument_id, &body)
    }
}

/// Decode one snapshot payload. The id in the URL wins over any id in the body.
pub fn parse_snapshot(instrument_id: &str, body: &str) -> Result<Observation, FeedError> {
    let raw: RawSnapshot =
        serde_json::from_str(body).map_err(|e| FeedError::Payload(e.to_string()))?;

    if let Some(id) = raw.instrument_id.as_deref() {
        if !id.eq_ignore_ascii_case(instrument_id) {
            return Err(FeedError::Payload(format!(
                "asked for {} but payload is for {}",
                instrument_id, id
            )));
        }
    }

    let timestamp = DateTime::from_timestamp(raw.timestamp, 0)
        .ok_or_else(|| FeedError::Payload(format!("bad timestamp {}", raw.timestamp)))?;

    Ok(Observation {
        snapshot: Snapshot::new(instrument_id, timestamp, raw.open_interest, raw.ltp),
        volume: raw.volume,
        technicals: Technicals {
            rsi: raw.rsi,
            adx: raw.adx,
            volume_ratio: raw.volume_ratio,
            momentum_pct: raw.momentum_pct,
            sma: raw.sma,
        },
        prev_close: raw.prev_close,
    })
}

#[async_trait]
impl SnapshotFeed for HttpFeed {
    async fn fetch(&mut self, instrument_id: &str) -> Result<Observation, FeedError> {
        self.fetch_snapshot(instrument_id).await
    }
}
