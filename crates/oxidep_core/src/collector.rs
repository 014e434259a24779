use anyhow::{Context, Result};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use crate::constants::PYTHON_EXTENSIONS;

fn is_python_source(p: &Path) -> bool {
    p.extension().and_then(|e| e.to_str()).is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

/// Python source files under `root`: the file itself if it is one, every
/// `*.py` below it if it is a directory, nothing otherwise.
///
/// Ignore files are not consulted; generated or vendored code still counts.
pub fn find_source_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(if is_python_source(root) { vec![root.to_path_buf()] } else { Vec::new() });
    }
    if !root.is_dir() {
        trace!("Nothing to search at {}", root.display());
        return Ok(Vec::new());
    }

    debug!("Walking directory tree from root: {}", root.display());
    let mut files: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(root).standard_filters(false).build();
    for res in walker {
        let dent = res.with_context(|| format!("Failed to walk {}", root.display()))?;
        let p = dent.path();
        if p.is_file() && is_python_source(p) {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    debug!("Collected {} source files under {}", files.len(), root.display());
    Ok(files)
}

/// The resolved identities of every source file under `roots`.
///
/// Paths are canonicalised so that the same file reached through different
/// spellings (`./pkg/a.py`, `pkg/../pkg/a.py`, a symlink) counts once.
pub fn collect_files<P: AsRef<Path>>(roots: &[P]) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for root in roots {
        for file in find_source_files(root.as_ref())? {
            files.insert(file.canonicalize().unwrap_or(file));
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_file;
    use tempfile::TempDir;

    #[test]
    fn test_find_source_files_in_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "pkg/__init__.py", "");
        create_test_file(root, "pkg/sub/deep.py", "");
        create_test_file(root, ".hidden/visible.py", "");
        create_test_file(root, "pkg/notes.txt", "");
        create_test_file(root, "pkg/module.pyc", "");

        let mut files = find_source_files(root).unwrap();
        files.sort();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec![".hidden/visible.py", "pkg/__init__.py", "pkg/sub/deep.py"]);
    }

    #[test]
    fn test_find_source_files_ignores_ignore_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        create_test_file(root, ".gitignore", "build/\n");
        create_test_file(root, ".ignore", "generated/\n");
        create_test_file(root, "app.py", "");
        create_test_file(root, "build/lib.py", "");
        create_test_file(root, "generated/client.py", "");

        let mut files = find_source_files(root).unwrap();
        files.sort();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["app.py", "build/lib.py", "generated/client.py"]);
    }

    #[test]
    fn test_find_source_files_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "script.py", "import os\n");
        assert_eq!(find_source_files(&file).unwrap(), vec![file]);

        let toml = create_test_file(temp_dir.path(), "pyproject.toml", "");
        assert!(find_source_files(&toml).unwrap().is_empty());
    }

    #[test]
    fn test_find_source_files_missing_root() {
        assert!(find_source_files(Path::new("/definitely/not/here")).unwrap().is_empty());
    }

    #[test]
    fn test_collect_files_deduplicates_by_identity() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "pkg/a.py", "");
        create_test_file(root, "pkg/b.py", "");

        let files =
            collect_files(&[root.join("pkg"), root.join("pkg/a.py"), root.join("pkg/../pkg")])
                .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_collect_files_set_difference() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/app.py", "");
        create_test_file(root, "src/tests/test_app.py", "");

        let included = collect_files(&[root.join("src")]).unwrap();
        let excluded = collect_files(&[root.join("src/./tests")]).unwrap();
        let remaining: Vec<_> = included.difference(&excluded).collect();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ends_with("app.py"));
    }
}
