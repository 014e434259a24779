use log::{debug, trace};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use toml::Value;

use crate::error::ConfigError;

/// Settings read from the `[tool.oxidep]` block of `pyproject.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Imported module names skipped entirely.
    pub ignore_imports: Vec<String>,
    /// Parent package → child modules it also provides (split packages).
    pub child_packages: BTreeMap<String, Vec<String>>,
    /// Declared packages exempt from the unused-dependency check.
    pub ignore_dependencies: Vec<String>,
    /// Extra local package names, used only for the dev-dependency check.
    pub local_test_packages: Vec<String>,
    /// Extra test roots, resolved against the manifest's directory.
    pub local_test_paths: Vec<PathBuf>,
    pub ignore_dependencies_order: bool,
    pub ignore_dev_dependencies_order: bool,
}

/// Where a validated option lands in [`Config`]; the variant fixes its shape.
#[derive(Clone, Copy)]
enum Target {
    Flag(fn(&mut Config) -> &mut bool),
    Strings(fn(&mut Config) -> &mut Vec<String>),
    Paths(fn(&mut Config) -> &mut Vec<PathBuf>),
    StringsTable(fn(&mut Config) -> &mut BTreeMap<String, Vec<String>>),
}

impl Target {
    fn expected(self) -> &'static str {
        match self {
            Target::Flag(_) => "bool",
            Target::Strings(_) | Target::Paths(_) => "list of strings",
            Target::StringsTable(_) => "table of string lists",
        }
    }

    /// Store `value` if it has the right shape; `None` otherwise.
    fn apply(self, config: &mut Config, value: &Value, base_dir: &Path) -> Option<()> {
        match self {
            Target::Flag(field) => *field(config) = value.as_bool()?,
            Target::Strings(field) => *field(config) = strings(value)?,
            Target::Paths(field) => {
                *field(config) = strings(value)?.iter().map(|p| base_dir.join(p)).collect()
            }
            Target::StringsTable(field) => {
                *field(config) = value
                    .as_table()?
                    .iter()
                    .map(|(parent, children)| Some((parent.clone(), strings(children)?)))
                    .collect::<Option<_>>()?
            }
        }
        Some(())
    }
}

struct Field {
    name: &'static str,
    target: Target,
}

const FIELDS: &[Field] = &[
    Field { name: "ignore_imports", target: Target::Strings(|c| &mut c.ignore_imports) },
    Field { name: "child_packages", target: Target::StringsTable(|c| &mut c.child_packages) },
    Field { name: "ignore_dependencies", target: Target::Strings(|c| &mut c.ignore_dependencies) },
    Field { name: "local_test_packages", target: Target::Strings(|c| &mut c.local_test_packages) },
    Field { name: "local_test_paths", target: Target::Paths(|c| &mut c.local_test_paths) },
    Field {
        name: "ignore_dependencies_order",
        target: Target::Flag(|c| &mut c.ignore_dependencies_order),
    },
    Field {
        name: "ignore_dev_dependencies_order",
        target: Target::Flag(|c| &mut c.ignore_dev_dependencies_order),
    },
];

fn strings(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(|item| item.as_str().map(str::to_owned)).collect()
}

impl Config {
    /// Validate the tool block against the option table.
    ///
    /// `ignore-imports` and `ignore_imports` name the same option. An absent
    /// block gives the defaults.
    pub fn from_table(table: Option<&toml::Table>, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        let Some(table) = table else {
            debug!("No tool configuration, using defaults");
            return Ok(config);
        };
        for (key, value) in table {
            let name = key.replace('-', "_");
            let field = FIELDS
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| ConfigError::UnknownOption { key: key.clone() })?;
            trace!("Config option '{}' = {}", key, value);
            field.target.apply(&mut config, value, base_dir).ok_or_else(|| {
                ConfigError::WrongType {
                    key: key.clone(),
                    expected: field.target.expected(),
                    got: value.to_string(),
                }
            })?;
        }
        debug!("Loaded {} config options", table.len());
        Ok(config)
    }
}
