pub mod http;
pub mod replay;

pub use http::HttpFeed;
pub use replay::ReplayFeed;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Observation;

/// Why a feed could not produce an observation this cycle. Never fatal:
/// the instrument is skipped and retried next cycle.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("feed returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("no data for {0}")]
    NotFound(String),
}

/// Source of per-cycle observations. `&mut self` keeps per-instrument
/// fetches sequential for a single owner.
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    async fn fetch(&mut self, instrument_id: &str) -> Result<Observation, FeedError>;
}
