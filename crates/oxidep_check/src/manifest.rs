use anyhow::Result;
use log::{debug, info, trace};
use oxidep_core::{DistributionIndex, Warned, canon, fix_canonical_names};
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};
use toml::{Table, Value};

use crate::{
    config::Config,
    error::ManifestError,
    project::{DEPENDENCIES, DEV_DEPENDENCIES, Project, check_order},
};

pub const MANIFEST_NAME: &str = "pyproject.toml";
const TOOL_NAME: &str = "oxidep";

/// The manifest named among `paths`, if exactly one is.
pub fn find_project_file(paths: &[PathBuf]) -> Result<Option<PathBuf>> {
    let manifests: BTreeSet<&PathBuf> =
        paths.iter().filter(|p| p.file_name().is_some_and(|n| n == MANIFEST_NAME)).collect();
    if manifests.len() > 1 {
        return Err(ManifestError::MultipleManifests.into());
    }
    Ok(manifests.into_iter().next().cloned())
}

/// Read a Poetry `pyproject.toml` into a [`Project`].
///
/// Declared names come back canonical, with sortedness and spelling warnings
/// attached. With no manifest at all the project is empty, so every imported
/// package will be reported as missing.
pub fn read_project(
    manifest: Option<&Path>,
    index: &DistributionIndex,
) -> Result<Warned<Project>> {
    let Some(path) = manifest else {
        info!("{} not specified, checking against an empty project", MANIFEST_NAME);
        return Ok(Warned::unit(Project::default()));
    };
    info!("Reading project file {}", path.display());

    let source = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ManifestError::NotFound { path: path.to_path_buf() },
        _ => ManifestError::Read { path: path.to_path_buf(), source },
    })?;
    let document: Table = source
        .parse()
        .map_err(|source| ManifestError::Parse { path: path.to_path_buf(), source })?;

    let tool = section(&document, "tool", "tool", path)?;
    let poetry = section(tool, "poetry", "tool.poetry", path)?;
    let tool_config = optional_table(tool.get(TOOL_NAME), "tool.oxidep", path)?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    let config = Config::from_table(tool_config, base_dir)?;

    let deps = dependency_names(poetry.get(DEPENDENCIES), "tool.poetry.dependencies", path)?
        .ok_or_else(|| ManifestError::MissingSection {
            path: path.to_path_buf(),
            section: "tool.poetry.dependencies",
        })?;
    let deps = process(deps, DEPENDENCIES, config.ignore_dependencies_order, index);

    // Poetry accepts dev dependencies in two places; both count.
    let old_dev =
        dependency_names(poetry.get(DEV_DEPENDENCIES), "tool.poetry.dev-dependencies", path)?;
    let new_dev = dependency_names(
        poetry
            .get("group")
            .and_then(|g| g.get("dev"))
            .and_then(|d| d.get(DEPENDENCIES)),
        "tool.poetry.group.dev.dependencies",
        path,
    )?;
    let ignore_dev_order = config.ignore_dev_dependencies_order;
    let dev_deps = Warned::gather(
        [old_dev, new_dev]
            .into_iter()
            .flatten()
            .map(|names| process(names, DEV_DEPENDENCIES, ignore_dev_order, index)),
    )
    .map(|sets| sets.into_iter().flatten().collect::<BTreeSet<String>>());

    let packages = local_packages(poetry.get("packages"), path)?;
    debug!("Project publishes {} local packages", packages.len());

    let project = Project {
        dependencies: deps.value().clone(),
        dev_dependencies: deps.value().union(dev_deps.value()).cloned().collect(),
        local_packages: packages.iter().map(|p| canon(&p.include)).collect(),
        extra_paths: packages.iter().map(|p| p.root(base_dir)).collect(),
        config,
    };
    debug!(
        "Declared {} dependencies and {} dev-dependencies",
        project.dependencies.len(),
        project.dev_dependencies.len()
    );
    Ok(Warned::gather([deps, dev_deps]).set(project))
}

/// Canonicalise one dependency group, checking its declared order first.
fn process(
    names: Vec<String>,
    label: &str,
    ignore_order: bool,
    index: &DistributionIndex,
) -> Warned<BTreeSet<String>> {
    Warned::unit(names)
        .collect(|names| if ignore_order { Vec::new() } else { check_order(names, label) })
        .flat_map(|names| fix_canonical_names(names.iter().map(String::as_str), index))
}

fn section<'a>(
    table: &'a Table,
    key: &str,
    section: &'static str,
    path: &Path,
) -> Result<&'a Table, ManifestError> {
    optional_table(table.get(key), section, path)?
        .ok_or_else(|| ManifestError::MissingSection { path: path.to_path_buf(), section })
}

fn optional_table<'a>(
    value: Option<&'a Value>,
    section: &str,
    path: &Path,
) -> Result<Option<&'a Table>, ManifestError> {
    value
        .map(|v| v.as_table().ok_or_else(|| invalid(path, format!("[{section}] must be a table"))))
        .transpose()
}

/// Keys of a dependency table in declaration order; `None` if absent.
fn dependency_names(
    value: Option<&Value>,
    section: &str,
    path: &Path,
) -> Result<Option<Vec<String>>, ManifestError> {
    let Some(table) = optional_table(value, section, path)? else {
        return Ok(None);
    };
    let names: Vec<String> = table.keys().cloned().collect();
    trace!("[{}] declares {:?}", section, names);
    Ok(Some(names))
}

/// A `packages = [{ include = "...", from = "..." }]` entry.
struct LocalPackage {
    include: String,
    from: Option<String>,
}

impl LocalPackage {
    fn root(&self, base_dir: &Path) -> PathBuf {
        match &self.from {
            Some(from) => base_dir.join(from).join(&self.include),
            None => base_dir.join(&self.include),
        }
    }
}

fn local_packages(
    value: Option<&Value>,
    path: &Path,
) -> Result<Vec<LocalPackage>, ManifestError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let entries =
        value.as_array().ok_or_else(|| invalid(path, "packages must be an array of tables"))?;
    entries
        .iter()
        .map(|entry| {
            let include = entry
                .get("include")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(path, "every packages entry needs a string 'include'"))?;
            let from = entry
                .get("from")
                .map(|from| {
                    from.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(path, "packages 'from' must be a string"))
                })
                .transpose()?;
            Ok(LocalPackage { include: include.to_string(), from })
        })
        .collect()
}

fn invalid(path: &Path, reason: impl Into<String>) -> ManifestError {
    ManifestError::Invalid { path: path.to_path_buf(), reason: reason.into() }
}
