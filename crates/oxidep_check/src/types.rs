use oxidep_core::Warning;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub warnings: Vec<Warning>,
    pub files_analyzed: usize,
}

impl CheckResult {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Packages the warnings say should be declared, sorted and deduplicated.
    pub fn missing_packages(&self) -> BTreeSet<&str> {
        self.warnings.iter().filter_map(Warning::missing_package_name).collect()
    }
}
