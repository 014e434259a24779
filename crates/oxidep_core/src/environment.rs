//! What the target Python runtime looks like: its import search path and the
//! names of its standard-library modules.
//!
//! Both vary between interpreter versions, so they are asked of the
//! interpreter itself rather than baked in.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace};
use serde::Deserialize;
use std::{collections::BTreeSet, path::PathBuf, process::Command};

use crate::constants::{BUNDLED_MODULES, FUTURE_MODULE};

const PROBE_SCRIPT: &str = r#"
import json
import sys

stdlib = getattr(sys, 'stdlib_module_names', None)
json.dump({
    "version": list(sys.version_info[:3]),
    "path": [entry for entry in sys.path if entry],
    "stdlib": None if stdlib is None else sorted(set(stdlib) | set(sys.builtin_module_names)),
}, sys.stdout)
"#;

#[derive(Debug, Deserialize)]
struct ProbeReport {
    version: Vec<u32>,
    path: Vec<PathBuf>,
    stdlib: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct PythonEnvironment {
    search_path: Vec<PathBuf>,
    stdlib_modules: BTreeSet<String>,
}

impl PythonEnvironment {
    pub fn new(search_path: Vec<PathBuf>, stdlib_modules: BTreeSet<String>) -> Self {
        Self { search_path, stdlib_modules }
    }

    /// Run `python` once and record its search path and standard-library names.
    pub fn from_interpreter(python: &str) -> Result<Self> {
        debug!("Probing interpreter: {}", python);
        let output = Command::new(python)
            .args(["-c", PROBE_SCRIPT])
            .output()
            .with_context(|| format!("Failed to run Python interpreter '{}'", python))?;
        if !output.status.success() {
            return Err(anyhow!(
                "Python interpreter '{}' failed: {}",
                python,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Self::from_probe(&output.stdout).with_context(|| format!("Probing '{}'", python))
    }

    fn from_probe(stdout: &[u8]) -> Result<Self> {
        let report: ProbeReport =
            serde_json::from_slice(stdout).context("Unexpected interpreter probe output")?;
        let version =
            report.version.iter().map(|part| part.to_string()).collect::<Vec<_>>().join(".");
        let Some(stdlib) = report.stdlib else {
            return Err(anyhow!(
                "Python {} does not list its standard library modules; \
                 Python 3.10 or newer is required",
                version
            ));
        };
        info!("Using Python {} with {} search path entries", version, report.path.len());
        trace!("Search path: {:?}", report.path);
        Ok(Self::new(report.path, stdlib.into_iter().collect()))
    }

    /// Directories (and archives) the runtime imports from, in lookup order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn stdlib_modules(&self) -> &BTreeSet<String> {
        &self.stdlib_modules
    }

    /// Whether an imported top-level module comes from outside the runtime.
    ///
    /// `setuptools` and `pkg_resources` are not technically standard library
    /// but ship with the runtime, so they never need declaring.
    pub fn is_external(&self, module: &str) -> bool {
        if module == FUTURE_MODULE || BUNDLED_MODULES.contains(&module) {
            return false;
        }
        !self.stdlib_modules.contains(module)
    }
}
