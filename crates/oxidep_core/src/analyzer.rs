use anyhow::Result;
use dashmap::DashMap;
use log::{debug, info, trace};
use rayon::prelude::*;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::{
    collector::collect_files,
    distributions::DistributionIndex,
    environment::PythonEnvironment,
    parser::imports_for,
    warned::Warned,
};

/// Per-run state shared by every check: the distribution index, built once,
/// and the parsed imports of every file seen so far.
pub struct Analyzer {
    index: DistributionIndex,
    import_cache: DashMap<PathBuf, Vec<String>>,
}

impl Analyzer {
    pub fn new(env: PythonEnvironment) -> Self {
        Self { index: DistributionIndex::new(env), import_cache: DashMap::new() }
    }

    pub fn index(&self) -> &DistributionIndex {
        &self.index
    }

    pub fn environment(&self) -> &PythonEnvironment {
        self.index.environment()
    }

    /// Number of distinct source files parsed during this run.
    pub fn files_analyzed(&self) -> usize {
        self.import_cache.len()
    }

    /// External modules imported anywhere in `files`: deduplicated and sorted.
    ///
    /// Later stages rely on the sort for deterministic warning order.
    pub fn external_modules(&self, files: &BTreeSet<PathBuf>) -> Result<Vec<String>> {
        info!("Parsing {} source files in parallel", files.len());
        let per_file: Vec<Vec<String>> = files
            .par_iter()
            .map(|file| imports_for(file, &self.import_cache))
            .collect::<Result<_>>()?;

        let env = self.environment();
        let mut modules: BTreeSet<String> = BTreeSet::new();
        for module in per_file.iter().flatten() {
            if env.is_external(module) {
                modules.insert(module.clone());
            } else {
                trace!("Ignoring standard library module '{}'", module);
            }
        }
        debug!("Found {} external modules", modules.len());
        Ok(modules.into_iter().collect())
    }

    /// [`Analyzer::external_modules`] over every source file under `paths`.
    pub fn get_external_modules<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<String>> {
        self.external_modules(&collect_files(paths)?)
    }

    pub fn find_packages(
        &self,
        module: &str,
        local_packages: &BTreeSet<String>,
    ) -> Warned<Vec<String>> {
        self.index.find_packages(module, local_packages)
    }
}
