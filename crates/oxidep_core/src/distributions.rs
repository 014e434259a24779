//! Which installed distribution packages provide which importable modules.
//!
//! The catalog is built from the `*.dist-info` and `*.egg-info` metadata found
//! in every search-path directory, on first use, and reused for the rest of the
//! run. Nothing installs or removes packages mid-run, so it is never
//! invalidated.

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use path_clean::clean;
use std::{
    collections::{BTreeSet, HashMap},
    fs, io,
    path::{Component, Path, PathBuf},
    sync::OnceLock,
};

use crate::{
    canon::canon,
    constants::{DIST_INFO_SUFFIX, EGG_INFO_SUFFIX, EXTENSION_MODULE_SUFFIXES, NON_MODULE_DIRS},
    environment::PythonEnvironment,
    warned::{Violation, Warned},
};

/// One installed distribution, as described by its metadata directory.
#[derive(Debug, Clone)]
struct Distribution {
    name: String,
    top_level: Vec<String>,
    files: Vec<PathBuf>,
}

impl Distribution {
    /// Every top-level module name this distribution appears to provide.
    fn modules(&self) -> impl Iterator<Item = String> + '_ {
        self.top_level.iter().cloned().chain(self.files.iter().filter_map(|f| top_level_name(f)))
    }
}

#[derive(Debug, Default)]
struct Catalog {
    /// module -> sorted distribution names
    providers: HashMap<String, Vec<String>>,
    /// canonical name -> name the distribution calls itself
    preferred: HashMap<String, String>,
}

pub struct DistributionIndex {
    env: PythonEnvironment,
    catalog: OnceLock<Catalog>,
}

impl DistributionIndex {
    pub fn new(env: PythonEnvironment) -> Self {
        Self { env, catalog: OnceLock::new() }
    }

    pub fn environment(&self) -> &PythonEnvironment {
        &self.env
    }

    fn catalog(&self) -> &Catalog {
        self.catalog.get_or_init(|| build_catalog(self.env.search_path()))
    }

    /// Distribution names that ship `module`, sorted.
    pub fn providers(&self, module: &str) -> Option<&[String]> {
        self.catalog().providers.get(module).map(Vec::as_slice)
    }

    /// The name an installed distribution gives itself, looked up by any spelling.
    pub fn preferred_name(&self, package: &str) -> Option<String> {
        self.catalog().preferred.get(&canon(package)).cloned()
    }

    /// Which distribution(s) provide the top-level module `module`?
    ///
    /// Packaging metadata cannot fully answer this, so the answer is a guess:
    /// the project's own packages first, then installed metadata, then bare
    /// directories on the search path (flagged, since nothing manages them).
    /// An empty list means the module was found nowhere.
    pub fn find_packages(
        &self,
        module: &str,
        local_packages: &BTreeSet<String>,
    ) -> Warned<Vec<String>> {
        if local_packages.contains(&canon(module)) {
            trace!("Module '{}' is a local package", module);
            return Warned::unit(vec![module.to_string()]);
        }
        if let Some(dists) = self.providers(module) {
            trace!("Module '{}' is provided by {:?}", module, dists);
            return Warned::unit(dists.to_vec());
        }
        if self.env.search_path().iter().any(|dir| dir.join(module).is_dir()) {
            debug!("Module '{}' found on the search path without metadata", module);
            return Warned::unit(vec![module.to_string()]).warn(Violation::UnmanagedModule.warn(
                format!("Module '{module}' not under package management but found on python path"),
            ));
        }
        trace!("Module '{}' not found", module);
        Warned::unit(Vec::new())
    }
}

fn build_catalog(search_path: &[PathBuf]) -> Catalog {
    debug!("Scanning {} search path entries for distributions", search_path.len());
    let mut providers: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut preferred: HashMap<String, String> = HashMap::new();
    let mut count = 0usize;

    for site in search_path {
        if !site.is_dir() {
            trace!("Skipping non-directory search path entry: {}", site.display());
            continue;
        }
        let entries = match metadata_entries(site) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {}: {:#}", site.display(), e);
                continue;
            }
        };
        for meta in entries {
            let dist = match read_distribution(&meta, site) {
                Ok(Some(dist)) => dist,
                Ok(None) => {
                    trace!("No distribution name in {}", meta.display());
                    continue;
                }
                Err(e) => {
                    warn!("Skipping unreadable distribution metadata {}: {:#}", meta.display(), e);
                    continue;
                }
            };
            count += 1;
            trace!("Distribution '{}' at {}", dist.name, meta.display());
            preferred.entry(canon(&dist.name)).or_insert_with(|| dist.name.clone());
            for module in dist.modules() {
                providers.entry(module).or_default().insert(dist.name.clone());
            }
        }
    }

    debug!("Indexed {} distributions providing {} modules", count, providers.len());
    Catalog {
        providers: providers
            .into_iter()
            .map(|(module, dists)| (module, dists.into_iter().collect()))
            .collect(),
        preferred,
    }
}

fn metadata_entries(site: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(site)? {
        let path = entry?.path();
        let is_metadata = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(DIST_INFO_SUFFIX) || n.ends_with(EGG_INFO_SUFFIX));
        if is_metadata {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn read_distribution(meta: &Path, site: &Path) -> Result<Option<Distribution>> {
    let is_egg = meta.to_string_lossy().ends_with(EGG_INFO_SUFFIX);

    // A bare `*.egg-info` file is the PKG-INFO itself.
    if meta.is_file() {
        let text = fs::read_to_string(meta)
            .with_context(|| format!("Failed to read {}", meta.display()))?;
        return Ok(metadata_name(&text).map(|name| Distribution {
            name,
            top_level: Vec::new(),
            files: Vec::new(),
        }));
    }

    let metadata_file = meta.join(if is_egg { "PKG-INFO" } else { "METADATA" });
    let Some(text) = read_optional(&metadata_file)? else {
        return Ok(None);
    };
    let Some(name) = metadata_name(&text) else {
        return Ok(None);
    };

    let top_level = read_optional(&meta.join("top_level.txt"))?
        .map(|t| t.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let files = if is_egg { egg_files(meta, site)? } else { record_files(meta)? };

    Ok(Some(Distribution { name, top_level, files }))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// The `Name:` header of a METADATA / PKG-INFO document.
fn metadata_name(text: &str) -> Option<String> {
    text.lines()
        .take_while(|line| !line.trim().is_empty())
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case("name").then(|| value.trim().to_string())
        })
        .filter(|name| !name.is_empty())
}

fn record_files(meta: &Path) -> Result<Vec<PathBuf>> {
    let Some(record) = read_optional(&meta.join("RECORD"))? else {
        return Ok(Vec::new());
    };
    Ok(record.lines().filter_map(record_path).map(PathBuf::from).collect())
}

/// The path column of one RECORD (CSV) row.
fn record_path(line: &str) -> Option<&str> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    match line.strip_prefix('"') {
        Some(quoted) => quoted.split_once('"').map(|(path, _)| path),
        None => Some(line.split_once(',').map_or(line, |(path, _)| path)),
    }
}

/// Files of a legacy egg install, relative to the site directory.
fn egg_files(meta: &Path, site: &Path) -> Result<Vec<PathBuf>> {
    if let Some(installed) = read_optional(&meta.join("installed-files.txt"))? {
        // Listed relative to the egg-info directory itself.
        return Ok(installed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                clean(meta.join(line)).strip_prefix(site).ok().map(Path::to_path_buf)
            })
            .collect());
    }
    Ok(read_optional(&meta.join("SOURCES.txt"))?
        .map(|sources| {
            sources.lines().map(str::trim).filter(|l| !l.is_empty()).map(PathBuf::from).collect()
        })
        .unwrap_or_default())
}

/// The importable top-level name implied by one installed file.
///
/// A file at the site root is a module (`six.py` -> `six`, compiled
/// `_speedups.cpython-311-x86_64-linux-gnu.so` -> `_speedups`); anything deeper
/// belongs to its top-level directory. Files outside the site directory
/// contribute nothing.
fn top_level_name(file: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in file.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    let first = *parts.first()?;
    if parts.len() == 1 {
        return Some(module_file_name(first).to_string());
    }
    let is_metadata = first.ends_with(DIST_INFO_SUFFIX) || first.ends_with(EGG_INFO_SUFFIX);
    if NON_MODULE_DIRS.contains(&first) || is_metadata {
        return None;
    }
    Some(first.to_string())
}

fn module_file_name(file_name: &str) -> &str {
    if let Some(stem) = file_name.strip_suffix(".py") {
        return stem;
    }
    let is_extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSION_MODULE_SUFFIXES.contains(&ext));
    if is_extension {
        return file_name.split('.').next().unwrap_or(file_name);
    }
    file_name
}
