use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `code: message` line per warning
    #[default]
    Text,
    /// A JSON array of warning records
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "check")]
#[command(about = "Check a Python project's declared dependencies against its imports")]
pub struct CheckArgs {
    /// Source roots to scan; a pyproject.toml among them is used as the project file
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Project file to read dependencies from
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Test code: excluded from the dependency check, used for the dev-dependency check
    #[arg(long)]
    pub tests: Vec<PathBuf>,

    /// Python interpreter whose installed packages and standard library are used
    #[arg(long, env = "OXIDEP_PYTHON", default_value = "python3")]
    pub python: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
