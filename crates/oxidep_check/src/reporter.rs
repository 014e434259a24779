use std::{
    collections::BTreeSet,
    io::{self, Write},
};

use colored::Colorize;
use log::debug;
use oxidep_core::{Violation, Warning};
use serde::Serialize;

/// One warning as written by `--format json`.
#[derive(Debug, Serialize)]
struct WarningRecord<'a> {
    id: &'static str,
    code: Violation,
    message: &'a str,
    missing_package_name: Option<&'a str>,
}

impl<'a> From<&'a Warning> for WarningRecord<'a> {
    fn from(warning: &'a Warning) -> Self {
        Self {
            id: warning.code().id(),
            code: warning.code(),
            message: warning.message(),
            missing_package_name: warning.missing_package_name(),
        }
    }
}

pub fn print_no_problems_message<W: Write>(writer: &mut W) -> io::Result<()> {
    debug!("No dependency problems found");
    writeln!(writer, "{} No dependency problems found", "✓".green().bold())?;
    writer.flush()?;
    Ok(())
}

/// One `ID code: message` line per warning, in the order they were produced.
pub fn print_warnings<W: Write>(writer: &mut W, warnings: &[Warning]) -> io::Result<()> {
    debug!("Printing {} warnings", warnings.len());
    for warning in warnings {
        writeln!(
            writer,
            "{} {}: {}",
            warning.code().id().dimmed(),
            warning.code().code().yellow().bold(),
            warning.message()
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_warnings_json<W: Write>(writer: &mut W, warnings: &[Warning]) -> io::Result<()> {
    let records: Vec<WarningRecord<'_>> = warnings.iter().map(WarningRecord::from).collect();
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// How to fix the packages that should have been declared, if any.
pub fn missing_packages_advice(missing: &BTreeSet<&str>) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let word = if missing.len() == 1 { "package" } else { "packages" };
    let names: Vec<String> = missing.iter().map(|name| format!("'{name}'")).collect();
    Some(format!(
        "{} missing {word}: [{}].\n\
         Indirect dependencies may provide the packages you need, but can't specify what \
         version you rely on.\n\
         Therefore breaking changes in future versions could be introduced via the \
         intermediate dependency.\n\
         Solutions:\n\
         * List the package name as an explicit dependency.\n\
         * To assume that a dependency on X also provides Y, add X = [\"Y\"] to \
         \"child-packages\".\n\
         * To ignore an imported module name, add it to \"ignore-imports\".",
        missing.len(),
        names.join(", ")
    ))
}
