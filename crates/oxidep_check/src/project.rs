use anyhow::Result;
use log::{debug, info, trace};
use oxidep_core::{Analyzer, Violation, Warning, canon, collect_files};
use std::{collections::BTreeSet, path::PathBuf};

use crate::config::Config;

pub const DEPENDENCIES: &str = "dependencies";
pub const DEV_DEPENDENCIES: &str = "dev-dependencies";

/// The runtime itself, declared by Poetry projects and never imported.
const RUNTIME_NAME: &str = "python";

/// A project's declared dependencies and settings, as read from its manifest.
///
/// Package names in every set are canonical.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub dependencies: BTreeSet<String>,
    /// Always a superset of `dependencies`.
    pub dev_dependencies: BTreeSet<String>,
    pub config: Config,
    /// Packages the project publishes itself.
    pub local_packages: BTreeSet<String>,
    /// Source roots of those packages.
    pub extra_paths: Vec<PathBuf>,
}

/// One dependency group to reconcile against imported modules.
struct Group<'a> {
    declared: &'a BTreeSet<String>,
    local: &'a BTreeSet<String>,
    label: &'static str,
    check_unused: bool,
}

impl Project {
    /// Check runtime dependencies against `paths` and the project's own package
    /// roots. Files under `exclude` or a configured test path are not scanned.
    pub fn check_dependencies(
        &self,
        analyzer: &Analyzer,
        paths: &[PathBuf],
        exclude: &[PathBuf],
    ) -> Result<Vec<Warning>> {
        let paths: Vec<PathBuf> = paths.iter().chain(&self.extra_paths).cloned().collect();
        let exclude: Vec<PathBuf> =
            exclude.iter().chain(&self.config.local_test_paths).cloned().collect();
        let group = Group {
            declared: &self.dependencies,
            local: &self.local_packages,
            label: DEPENDENCIES,
            check_unused: true,
        };
        self.check_modules(analyzer, &paths, &exclude, &group)
    }

    /// Check dev dependencies against test code. Dev tooling (formatters,
    /// linters) is rarely imported, so nothing is reported as unused.
    pub fn check_dev_dependencies(
        &self,
        analyzer: &Analyzer,
        paths: &[PathBuf],
    ) -> Result<Vec<Warning>> {
        let paths: Vec<PathBuf> =
            paths.iter().chain(&self.config.local_test_paths).cloned().collect();
        let local: BTreeSet<String> = self
            .local_packages
            .iter()
            .cloned()
            .chain(self.config.local_test_packages.iter().map(|p| canon(p)))
            .collect();
        let group = Group {
            declared: &self.dev_dependencies,
            local: &local,
            label: DEV_DEPENDENCIES,
            check_unused: false,
        };
        self.check_modules(analyzer, &paths, &[], &group)
    }

    fn check_modules(
        &self,
        analyzer: &Analyzer,
        paths: &[PathBuf],
        exclude: &[PathBuf],
        group: &Group<'_>,
    ) -> Result<Vec<Warning>> {
        info!("Searching {}", display_paths(paths));
        let included = collect_files(paths)?;
        let excluded = collect_files(exclude)?;
        let files: BTreeSet<PathBuf> = included.difference(&excluded).cloned().collect();
        debug!("{} files to scan, {} excluded", files.len(), included.len() - files.len());

        let modules: Vec<String> = analyzer
            .external_modules(&files)?
            .into_iter()
            .filter(|module| !self.ignore_import(module))
            .collect();
        info!("{} imported: {:?}", group.label, modules);

        let mut warnings = Vec::new();
        let mut used: BTreeSet<String> = BTreeSet::from([RUNTIME_NAME.to_string()]);
        for module in &modules {
            let (found, found_warnings) =
                analyzer.find_packages(module, group.local).into_parts();
            warnings.extend(found_warnings);
            let found: Vec<String> = found.iter().map(|p| canon(p)).collect();
            trace!("Module '{}' resolves to {:?}", module, found);

            match found.as_slice() {
                [] => warnings.push(Violation::ModuleNotFound.missing(
                    format!(
                        "Module '{module}' is imported but not installed, \
                         so I don't know what package is needed"
                    ),
                    module.as_str(),
                )),
                [package] => {
                    used.insert(package.clone());
                    if !self.satisfied(package, group) {
                        warnings.push(Violation::MissingDependency.missing(
                            format!(
                                "Package '{package}' is imported but not listed in {}",
                                group.label
                            ),
                            package.as_str(),
                        ));
                    }
                }
                _ => {
                    let satisfied = found.iter().filter(|p| self.satisfied(p, group)).count();
                    let message = format!(
                        "Namespace package found: any of {} might provide '{module}'",
                        quoted_list(&found)
                    );
                    if satisfied == found.len() {
                        trace!("Namespace '{}' fully declared", module);
                        used.extend(found.iter().cloned());
                    } else if satisfied > 0 {
                        warnings.push(Violation::NamespaceUsed.warn(message));
                        used.extend(found.iter().cloned());
                    } else {
                        warnings.push(Violation::MissingNamespaceDependency.missing(
                            format!("{message}, and there are no dependencies on any of them"),
                            module.as_str(),
                        ));
                    }
                }
            }
        }

        if group.check_unused {
            let ignored: BTreeSet<String> =
                self.config.ignore_dependencies.iter().map(|p| canon(p)).collect();
            let unused: Vec<&String> = group
                .declared
                .iter()
                .filter(|p| !used.contains(*p) && !ignored.contains(*p))
                .collect();
            if !unused.is_empty() {
                warnings.push(Violation::UnusedDependency.warn(format!(
                    "Unused {} in project file: {}",
                    group.label,
                    quoted_list(&unused)
                )));
            }
        }
        debug!("{} check produced {} warnings", group.label, warnings.len());
        Ok(warnings)
    }

    fn satisfied(&self, package: &str, group: &Group<'_>) -> bool {
        group.local.contains(package) || self.required(package, group.declared)
    }

    /// Whether `package` is declared, local, or a child of a declared or local
    /// package under `child_packages`.
    pub fn required(&self, package: &str, declared: &BTreeSet<String>) -> bool {
        let mentioned = |p: &str| declared.contains(p) || self.local_packages.contains(p);
        if mentioned(package) {
            return true;
        }
        self.config.child_packages.iter().any(|(parent, children)| {
            children.iter().any(|child| canon(child) == package) && mentioned(&canon(parent))
        })
    }

    pub fn ignore_import(&self, module: &str) -> bool {
        self.config.ignore_imports.iter().any(|ignored| ignored == module)
    }
}

/// Report the first adjacent pair of `names` that is out of order, ignoring
/// case. A leading `python` entry is exempt.
pub fn check_order<S: AsRef<str>>(names: &[S], label: &str) -> Vec<Warning> {
    let names = match names.split_first() {
        Some((first, rest)) if first.as_ref() == RUNTIME_NAME => rest,
        _ => names,
    };
    names
        .windows(2)
        .find(|pair| pair[0].as_ref().to_lowercase() > pair[1].as_ref().to_lowercase())
        .map(|pair| {
            Violation::UnsortedDependency.warn(format!(
                "{label} are not sorted: '{}' before '{}'",
                pair[0].as_ref(),
                pair[1].as_ref()
            ))
        })
        .into_iter()
        .collect()
}

/// `['a', 'b']`
fn quoted_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxidep_core::PythonEnvironment;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content).unwrap();
        file_path
    }

    /// A site-packages directory holding one dist-info per `(name, modules)`.
    fn analyzer_with(site: &Path, dists: &[(&str, &[&str])]) -> Analyzer {
        for (name, modules) in dists {
            let info = format!("{}-1.0.dist-info", name.replace('-', "_"));
            create_test_file(site, &format!("{info}/METADATA"), &format!("Name: {name}\n"));
            let record: String = modules.iter().map(|m| format!("{m}/__init__.py,,\n")).collect();
            create_test_file(site, &format!("{info}/RECORD"), &record);
        }
        let stdlib = ["os", "sys"].iter().map(|s| s.to_string()).collect();
        Analyzer::new(PythonEnvironment::new(vec![site.to_path_buf()], stdlib))
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn reports(warnings: &[Warning]) -> Vec<String> {
        warnings.iter().map(Warning::report).collect()
    }

    #[test]
    fn test_check_order() {
        assert!(check_order(&["a", "b"], DEPENDENCIES).is_empty());
        assert!(check_order::<&str>(&[], DEPENDENCIES).is_empty());
        assert!(check_order(&["python", "alpha", "Beta"], DEPENDENCIES).is_empty());

        let warnings = check_order(&["b", "a"], DEPENDENCIES);
        assert_eq!(
            reports(&warnings),
            vec!["unsorted-dependency: dependencies are not sorted: 'b' before 'a'"]
        );
    }

    #[test]
    fn test_check_order_reports_only_first_inversion() {
        let warnings =
            check_order(&["python", "zeta", "alpha", "beta", "aardvark"], DEV_DEPENDENCIES);
        assert_eq!(
            reports(&warnings),
            vec!["unsorted-dependency: dev-dependencies are not sorted: 'zeta' before 'alpha'"]
        );
    }

    #[test]
    fn test_check_order_python_exempt_only_when_first() {
        assert_eq!(check_order(&["alpha", "python", "beta"], DEPENDENCIES).len(), 1);
    }

    #[test]
    fn test_required_via_child_packages() {
        let mut project = Project { dependencies: names(&["google-cloud"]), ..Default::default() };
        project
            .config
            .child_packages
            .insert("Google_Cloud".to_string(), vec!["Protobuf".to_string()]);
        assert!(project.required("google-cloud", &project.dependencies));
        assert!(project.required("protobuf", &project.dependencies));
        assert!(!project.required("grpcio", &project.dependencies));
    }

    #[test]
    fn test_required_via_local_parent() {
        let mut project = Project { local_packages: names(&["myapp"]), ..Default::default() };
        project
            .config
            .child_packages
            .insert("myapp".to_string(), vec!["myapp_plugins".to_string()]);
        assert!(project.required("myapp-plugins", &BTreeSet::new()));
    }

    #[test]
    fn test_missing_and_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[("requests", &["requests"])]);
        create_test_file(root, "src/app.py", "import os\nimport requests\nimport nowhere\n");

        let project = Project::default();
        let warnings = project.check_dependencies(&analyzer, &[root.join("src")], &[]).unwrap();
        assert_eq!(
            reports(&warnings),
            vec![
                "module-not-found: Module 'nowhere' is imported but not installed, so I don't know what package is needed",
                "missing-dependency: Package 'requests' is imported but not listed in dependencies",
            ]
        );
        assert_eq!(warnings[0].missing_package_name(), Some("nowhere"));
        assert_eq!(warnings[1].missing_package_name(), Some("requests"));
    }

    #[test]
    fn test_unused_respects_ignore_dependencies_and_python() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[("requests", &["requests"])]);
        create_test_file(root, "src/app.py", "import requests\n");

        let mut project = Project {
            dependencies: names(&["python", "requests", "black", "zeta", "alpha"]),
            ..Default::default()
        };
        project.config.ignore_dependencies = vec!["Black".to_string()];
        let warnings = project.check_dependencies(&analyzer, &[root.join("src")], &[]).unwrap();
        assert_eq!(
            reports(&warnings),
            vec!["unused-dependency: Unused dependencies in project file: ['alpha', 'zeta']"]
        );
        assert_eq!(warnings[0].missing_package_name(), None);
    }

    #[test]
    fn test_namespace_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(
            &root.join("site"),
            &[("google-auth", &["google"]), ("protobuf", &["google"])],
        );
        create_test_file(root, "src/app.py", "import google.protobuf\n");
        let src = [root.join("src")];

        let all =
            Project { dependencies: names(&["google-auth", "protobuf"]), ..Default::default() };
        assert!(all.check_dependencies(&analyzer, &src, &[]).unwrap().is_empty());

        let some = Project { dependencies: names(&["protobuf"]), ..Default::default() };
        assert_eq!(
            reports(&some.check_dependencies(&analyzer, &src, &[]).unwrap()),
            vec!["namespace-used: Namespace package found: any of ['google-auth', 'protobuf'] might provide 'google'"]
        );

        let none = Project::default();
        let warnings = none.check_dependencies(&analyzer, &src, &[]).unwrap();
        assert_eq!(
            reports(&warnings),
            vec!["missing-namespace-dependency: Namespace package found: any of ['google-auth', 'protobuf'] might provide 'google', and there are no dependencies on any of them"]
        );
        assert_eq!(warnings[0].missing_package_name(), Some("google"));
    }

    #[test]
    fn test_ignore_imports_and_local_packages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[]);
        create_test_file(
            root,
            "src/app.py",
            "import MyApp.core\nimport pkg_resources\nimport vendored\n",
        );

        let mut project = Project { local_packages: names(&["myapp"]), ..Default::default() };
        project.config.ignore_imports = vec!["vendored".to_string()];
        let warnings = project.check_dependencies(&analyzer, &[root.join("src")], &[]).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_excluded_and_test_paths_not_scanned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[("pytest", &["pytest"])]);
        create_test_file(root, "src/app.py", "import os\n");
        create_test_file(root, "src/tests/test_app.py", "import pytest\n");
        create_test_file(root, "src/fixtures/conftest.py", "import pytest\n");

        let mut project = Project::default();
        project.config.local_test_paths = vec![root.join("src/fixtures")];
        let warnings = project
            .check_dependencies(&analyzer, &[root.join("src")], &[root.join("src/tests")])
            .unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_dev_check_includes_test_paths_and_packages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[("pytest", &["pytest"])]);
        create_test_file(root, "tests/test_app.py", "import pytest\nimport testutils\n");
        create_test_file(root, "fixtures/conftest.py", "import hypothesis\n");

        let mut project = Project { dev_dependencies: names(&["black"]), ..Default::default() };
        project.config.local_test_paths = vec![root.join("fixtures")];
        project.config.local_test_packages = vec!["TestUtils".to_string()];
        let warnings = project.check_dev_dependencies(&analyzer, &[root.join("tests")]).unwrap();
        assert_eq!(
            reports(&warnings),
            vec![
                "module-not-found: Module 'hypothesis' is imported but not installed, so I don't know what package is needed",
                "missing-dependency: Package 'pytest' is imported but not listed in dev-dependencies",
            ]
        );
    }

    #[test]
    fn test_extra_paths_are_scanned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let analyzer = analyzer_with(&root.join("site"), &[("requests", &["requests"])]);
        create_test_file(root, "plugin/mod.py", "import requests\n");

        let project = Project { extra_paths: vec![root.join("plugin")], ..Default::default() };
        let warnings = project.check_dependencies(&analyzer, &[], &[]).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), Violation::MissingDependency);
    }

    #[test]
    fn test_quoted_list() {
        assert_eq!(quoted_list::<&str>(&[]), "[]");
        assert_eq!(quoted_list(&["a", "b"]), "['a', 'b']");
    }
}
