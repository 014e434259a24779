//! Values paired with the diagnostics produced while computing them.
//!
//! [`Warned`] is a writer-style accumulator: every combinator appends warnings
//! in call order and never inspects, reorders or deduplicates them. The
//! checker threads one through each stage so that a run always finishes with
//! the complete list of problems instead of stopping at the first.

use serde::Serialize;
use std::fmt;

/// The kinds of discrepancy a dependency check can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Violation {
    MissingDependency,
    ModuleNotFound,
    NamespaceUsed,
    MissingNamespaceDependency,
    UnusedDependency,
    UnsortedDependency,
    UncanonicalName,
    UnmanagedModule,
}

impl Violation {
    pub const ALL: [Violation; 8] = [
        Violation::MissingDependency,
        Violation::ModuleNotFound,
        Violation::NamespaceUsed,
        Violation::MissingNamespaceDependency,
        Violation::UnusedDependency,
        Violation::UnsortedDependency,
        Violation::UncanonicalName,
        Violation::UnmanagedModule,
    ];

    /// Stable, externally visible code.
    pub fn code(self) -> &'static str {
        match self {
            Violation::MissingDependency => "missing-dependency",
            Violation::ModuleNotFound => "module-not-found",
            Violation::NamespaceUsed => "namespace-used",
            Violation::MissingNamespaceDependency => "missing-namespace-dependency",
            Violation::UnusedDependency => "unused-dependency",
            Violation::UnsortedDependency => "unsorted-dependency",
            Violation::UncanonicalName => "uncanonical-name",
            Violation::UnmanagedModule => "unmanaged-module",
        }
    }

    /// Short identifier, suitable for a future flake8-style plugin.
    pub fn id(self) -> &'static str {
        match self {
            Violation::MissingDependency => "ODEP001",
            Violation::ModuleNotFound => "ODEP002",
            Violation::NamespaceUsed => "ODEP003",
            Violation::MissingNamespaceDependency => "ODEP004",
            Violation::UnusedDependency => "ODEP005",
            Violation::UnsortedDependency => "ODEP006",
            Violation::UncanonicalName => "ODEP007",
            Violation::UnmanagedModule => "ODEP008",
        }
    }

    /// Build a warning of this kind.
    pub fn warn(self, message: impl Into<String>) -> Warning {
        Warning { code: self, message: message.into(), missing_package_name: None }
    }

    /// Build a warning of this kind that names a package the project should add.
    pub fn missing(self, message: impl Into<String>, package: impl Into<String>) -> Warning {
        Warning { code: self, message: message.into(), missing_package_name: Some(package.into()) }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single diagnostic. Immutable once built; compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Warning {
    code: Violation,
    message: String,
    missing_package_name: Option<String>,
}

impl Warning {
    pub fn code(&self) -> Violation {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Set only when the warning implies a specific package should be declared.
    pub fn missing_package_name(&self) -> Option<&str> {
        self.missing_package_name.as_deref()
    }

    /// The rendered `"{code}: {message}"` line.
    pub fn report(&self) -> String {
        format!("{}: {}", self.code, self.message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A value plus the ordered warnings produced while computing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warned<T> {
    value: T,
    warnings: Vec<Warning>,
}

impl<T> Warned<T> {
    pub fn new(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    /// Wrap a value with no warnings.
    pub fn unit(value: T) -> Self {
        Self { value, warnings: Vec::new() }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn into_parts(self) -> (T, Vec<Warning>) {
        (self.value, self.warnings)
    }

    /// Change the value without touching the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Warned<U> {
        Warned { value: f(self.value), warnings: self.warnings }
    }

    /// Change the value and append whatever warnings `f` produced after ours.
    pub fn flat_map<U>(self, f: impl FnOnce(T) -> Warned<U>) -> Warned<U> {
        let mut warnings = self.warnings;
        let next = f(self.value);
        warnings.extend(next.warnings);
        Warned { value: next.value, warnings }
    }

    /// Append warnings generated from the current value.
    pub fn collect<I>(self, f: impl FnOnce(&T) -> I) -> Self
    where
        I: IntoIterator<Item = Warning>,
    {
        let extra = f(&self.value);
        self.warn_all(extra)
    }

    /// Fallible [`Warned::collect`]: an error from `f` aborts the whole chain.
    pub fn try_collect<I, E>(self, f: impl FnOnce(&T) -> Result<I, E>) -> Result<Self, E>
    where
        I: IntoIterator<Item = Warning>,
    {
        let extra = f(&self.value)?;
        Ok(self.warn_all(extra))
    }

    /// Append one warning.
    pub fn warn(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Append any number of warnings.
    pub fn warn_all(mut self, warnings: impl IntoIterator<Item = Warning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Replace the value, keeping the warnings.
    pub fn set<U>(self, value: U) -> Warned<U> {
        Warned { value, warnings: self.warnings }
    }

    /// Combine several results in order: values into a vector, warnings concatenated.
    pub fn gather(items: impl IntoIterator<Item = Warned<T>>) -> Warned<Vec<T>> {
        let mut values = Vec::new();
        let mut warnings = Vec::new();
        for item in items {
            values.push(item.value);
            warnings.extend(item.warnings);
        }
        Warned { value: values, warnings }
    }
}
