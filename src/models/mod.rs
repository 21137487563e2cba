pub mod setup;
pub mod snapshot;

pub use setup::*;
pub use snapshot::{Observation, Snapshot, Technicals};
