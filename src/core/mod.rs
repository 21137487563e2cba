pub mod classifier;
pub mod conviction;
pub mod history;
pub mod market_hours;
pub mod trend_metrics;
pub mod validation;

pub use classifier::{classify_setup, SetupClassifier};
pub use conviction::{conviction_score, ConvictionBreakdown, ConvictionScorer};
pub use history::HistoryStore;
pub use trend_metrics::{compute_trend_metrics, TrendMetrics};
pub use validation::{validate_snapshot, ValidationError};
