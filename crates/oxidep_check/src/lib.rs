//! Dependency conformance checking for Python projects.
//!
//! Reads a Poetry `pyproject.toml`, scans the project's source for imports and
//! reports every way the two disagree: packages imported but not declared,
//! packages declared but never imported, unsorted or misspelled declarations,
//! and modules no installed distribution accounts for.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use oxidep_check::{CheckArgs, print_warnings, run_dependency_check};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let args = CheckArgs::parse_from(["check", "src", "pyproject.toml", "--tests", "tests"]);
//! let result = run_dependency_check(&args)?;
//!
//! if !result.is_clean() {
//!     let mut stdout = BufWriter::new(std::io::stdout());
//!     print_warnings(&mut stdout, &result.warnings)?;
//!     stdout.flush()?;
//! }
//! # Ok(())
//! # }
//! ```

mod args;
mod checker;
mod config;
mod error;
mod manifest;
mod project;
mod reporter;
mod types;

// Re-export public API
pub use args::{CheckArgs, OutputFormat};
pub use checker::{check_project, run_dependency_check};
pub use config::Config;
pub use error::{ConfigError, ManifestError};
pub use manifest::{MANIFEST_NAME, find_project_file, read_project};
pub use project::{Project, check_order};
pub use reporter::{
    missing_packages_advice, print_no_problems_message, print_warnings, print_warnings_json,
};
pub use types::CheckResult;
