pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, CliConfig};
pub use core::fetcher::HttpCapabilitySource;
pub use core::orchestrator::Orchestrator;
pub use core::report::ZipCsvReportWriter;
pub use utils::error::{HarvestError, Result};
