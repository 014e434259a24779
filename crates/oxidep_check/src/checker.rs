use anyhow::Result;
use log::{debug, info};
use oxidep_core::{Analyzer, PythonEnvironment};
use std::path::{Path, PathBuf};

use crate::{
    args::CheckArgs,
    manifest::{find_project_file, read_project},
    types::CheckResult,
};

pub fn run_dependency_check(args: &CheckArgs) -> Result<CheckResult> {
    info!("Starting dependency check");

    let manifest = match &args.project {
        Some(project) => {
            debug!("Using project file from --project: {}", project.display());
            Some(project.clone())
        }
        None => find_project_file(&args.paths)?,
    };

    debug!("Probing interpreter '{}'", args.python);
    let env = PythonEnvironment::from_interpreter(&args.python)?;
    info!(
        "Interpreter has {} search path entries and {} standard modules",
        env.search_path().len(),
        env.stdlib_modules().len()
    );
    let analyzer = Analyzer::new(env);

    check_project(manifest.as_deref(), &args.paths, &args.tests, &analyzer)
}

/// Read the manifest, then check runtime and dev dependencies in that order.
///
/// Warnings keep that order: manifest problems, then the runtime check, then
/// the dev check.
pub fn check_project(
    manifest: Option<&Path>,
    paths: &[PathBuf],
    tests: &[PathBuf],
    analyzer: &Analyzer,
) -> Result<CheckResult> {
    let warnings = read_project(manifest, analyzer.index())?
        .try_collect(|project| project.check_dependencies(analyzer, paths, tests))?
        .try_collect(|project| project.check_dev_dependencies(analyzer, tests))?
        .into_warnings();

    info!("Dependency check complete. Found {} warnings", warnings.len());
    Ok(CheckResult { warnings, files_analyzed: analyzer.files_analyzed() })
}
