pub mod cli;
pub mod credentials;

use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportMode {
    /// Include the PDF V2 column and per-type breakdown
    Pdf,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "layer-harvester")]
#[command(about = "Extract hazardlookup layers from WMS capabilities documents")]
pub struct CliConfig {
    /// Output mode. Pass 'pdf' to include PDF V2 columns in the report and summary.
    #[arg(long, value_enum)]
    pub mode: Option<ReportMode>,

    /// Skip fetching from the credential directory even if files are present.
    #[arg(long)]
    pub no_fetch: bool,

    /// Path to a specific credential file to fetch. Can be repeated for
    /// multiple environments; takes precedence over auto-scanning the
    /// credential directory.
    #[arg(long = "env", value_name = "PATH")]
    pub env_files: Vec<String>,

    /// Directory scanned for <group>.<environment> credential files
    #[arg(long, default_value = "./envs")]
    pub envs_dir: String,

    /// Cache directory for fetched capabilities documents
    #[arg(long, default_value = "./input")]
    pub input_dir: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}

impl CliConfig {
    pub fn pdf_mode(&self) -> bool {
        matches!(self.mode, Some(ReportMode::Pdf))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("envs_dir", &self.envs_dir)?;
        validate_path("input_dir", &self.input_dir)?;
        validate_path("output_path", &self.output_path)?;
        Ok(())
    }
}
