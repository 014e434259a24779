//! Package name normalisation.
//!
//! Two declared names refer to the same dependency iff their canonical forms
//! match: runs of `-`, `_` and `.` collapse to a single `-` and letters are
//! lower-cased (PEP 503).

use log::{debug, trace};
use std::collections::BTreeSet;

use crate::{
    distributions::DistributionIndex,
    warned::{Violation, Warned},
};

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '.')
}

/// Normalise a package name for comparison.
pub fn canon(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if is_separator(c) {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

/// Replace declared names with their canonical forms.
///
/// A declared name may be written either in canonical form or exactly as the
/// installed distribution spells itself (`Django`); any other spelling gets an
/// uncanonical-name warning suggesting the preferred one. Distributions that
/// are not installed fall back to the canonical form as their preferred name.
pub fn fix_canonical_names<'a>(
    declared: impl IntoIterator<Item = &'a str>,
    index: &DistributionIndex,
) -> Warned<BTreeSet<String>> {
    let checked = declared.into_iter().map(|name| {
        let canonical = canon(name);
        if name == canonical {
            return Warned::unit(canonical);
        }
        let preferred = index.preferred_name(name).unwrap_or_else(|| canonical.clone());
        trace!("Declared '{}' canonical '{}' preferred '{}'", name, canonical, preferred);
        if name == preferred {
            Warned::unit(canonical)
        } else {
            debug!("Dependency '{}' is not spelled as '{}'", name, preferred);
            Warned::unit(canonical).warn(Violation::UncanonicalName.warn(format!(
                "dependency '{name}' is not the preferred name: consider '{preferred}'"
            )))
        }
    });
    Warned::gather(checked).map(|names| names.into_iter().collect())
}
