//! Core utilities for oxidep tools.
//!
//! This crate provides the shared machinery for checking a Python project's
//! declared dependencies against what its code imports:
//! - Accumulating warnings alongside values ([`Warned`])
//! - Parsing import statements from Python files
//! - Indexing installed distributions by the modules they provide
//! - Canonicalising package names
//! - Probing the target interpreter for its search path and standard library

mod analyzer;
mod canon;
mod collector;
mod constants;
mod distributions;
mod environment;
mod parser;
mod warned;

#[cfg(test)]
mod testing;

// Re-export public API
pub use analyzer::Analyzer;
pub use canon::{canon, fix_canonical_names};
pub use collector::{collect_files, find_source_files};
pub use constants::{BUNDLED_MODULES, PYTHON_EXTENSIONS};
pub use distributions::DistributionIndex;
pub use environment::PythonEnvironment;
pub use parser::{imports_for, imports_in_source};
pub use warned::{Violation, Warned, Warning};
