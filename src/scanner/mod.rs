pub mod orchestrator;
pub mod report;

pub use orchestrator::ScanOrchestrator;
pub use report::{ScanReport, ScanRow, SkippedInstrument};
