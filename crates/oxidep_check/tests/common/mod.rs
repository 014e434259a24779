#![allow(dead_code)]

use anyhow::Result;
use oxidep_check::{CheckResult, MANIFEST_NAME, check_project};
use oxidep_core::{Analyzer, PythonEnvironment};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

const STDLIB: &[&str] = &["json", "os", "pathlib", "sys", "unittest"];

/// A project tree plus a fake site-packages directory to check it against.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("site-packages")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn site(&self) -> PathBuf {
        self.root().join("site-packages")
    }

    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.root().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content).unwrap();
        file_path
    }

    /// Install a distribution called `name` that ships the given top-level packages.
    pub fn install(&self, name: &str, modules: &[&str]) {
        let info = format!("site-packages/{}-1.0.dist-info", name.replace('-', "_"));
        self.write(&format!("{info}/METADATA"), &format!("Metadata-Version: 2.1\nName: {name}\n"));
        let mut record = String::new();
        for module in modules {
            record.push_str(&format!("{module}/__init__.py,sha256=abc,10\n"));
            self.write(&format!("site-packages/{module}/__init__.py"), "");
        }
        record.push_str(&format!("{}-1.0.dist-info/RECORD,,\n", name.replace('-', "_")));
        self.write(&format!("{info}/RECORD"), &record);
    }

    pub fn manifest(&self, content: &str) -> PathBuf {
        self.write(MANIFEST_NAME, content)
    }

    pub fn analyzer(&self) -> Analyzer {
        let stdlib: BTreeSet<String> = STDLIB.iter().map(|s| s.to_string()).collect();
        Analyzer::new(PythonEnvironment::new(vec![self.site()], stdlib))
    }

    /// Check `src/` (and `tests` as test roots) against the manifest, if written.
    pub fn check(&self, tests: &[&str]) -> Result<CheckResult> {
        let manifest = self.root().join(MANIFEST_NAME);
        let manifest = manifest.is_file().then_some(manifest);
        let paths = vec![self.root().join("src")];
        let tests: Vec<PathBuf> = tests.iter().map(|t| self.root().join(t)).collect();
        check_project(manifest.as_deref(), &paths, &tests, &self.analyzer())
    }
}

pub fn reports(result: &CheckResult) -> Vec<String> {
    result.warnings.iter().map(|w| w.report()).collect()
}

pub fn codes(result: &CheckResult) -> Vec<&'static str> {
    result.warnings.iter().map(|w| w.code().code()).collect()
}
