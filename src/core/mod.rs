pub mod extractor;
pub mod fetcher;
pub mod orchestrator;
pub mod pdf;
pub mod report;

pub use crate::domain::model::{ExtractionResult, Layer, OutputGroup};
pub use crate::domain::ports::{CapabilitySource, ReportSink, Storage};
pub use crate::utils::error::Result;
