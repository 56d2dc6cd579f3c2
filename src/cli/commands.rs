//! CLI command definitions

use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Base URL of the activity stub service
    #[arg(long, default_value = "http://localhost:18086")]
    pub base_url: String,

    /// Print the final result map as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline specification
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,
}
