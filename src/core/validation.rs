use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Snapshot;

/// Reasons a snapshot is refused before it reaches the history store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{instrument}: negative open interest {value}")]
    NegativeOpenInterest { instrument: String, value: f64 },

    #[error("{instrument}: price must be positive, got {value}")]
    NonPositivePrice { instrument: String, value: f64 },

    #[error("{instrument}: non-finite {field}")]
    NonFinite {
        instrument: String,
        field: &'static str,
    },

    #[error("{instrument}: timestamp {got} is older than last recorded {last}")]
    OutOfOrderTimestamp {
        instrument: String,
        got: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Check a snapshot against its instrument's last recorded timestamp.
pub fn validate_snapshot(
    snapshot: &Snapshot,
    last_recorded: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    let instrument = || snapshot.instrument_id.clone();

    if !snapshot.open_interest.is_finite() {
        return Err(ValidationError::NonFinite {
            instrument: instrument(),
            field: "open_interest",
        });
    }
    if !snapshot.price.is_finite() {
        return Err(ValidationError::NonFinite {
            instrument: instrument(),
            field: "price",
        });
    }
    if snapshot.open_interest < 0.0 {
        return Err(ValidationError::NegativeOpenInterest {
            instrument: instrument(),
            value: snapshot.open_interest,
        });
    }
    if snapshot.price <= 0.0 {
        return Err(ValidationError::NonPositivePrice {
            instrument: instrument(),
            value: snapshot.price,
        });
    }
    if let Some(last) = last_recorded {
        if snapshot.timestamp < last {
            return Err(ValidationError::OutOfOrderTimestamp {
                instrument: instrument(),
                got: snapshot.timestamp,
                last,
            });
        }
    }
    Ok(())
}
