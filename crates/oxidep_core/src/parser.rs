use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, trace};
use rustpython_parser::{Parse, ast};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Top-level module names imported by `file`, in source order, duplicates kept.
pub fn imports_for(file: &Path, cache: &DashMap<PathBuf, Vec<String>>) -> Result<Vec<String>> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Parsing file for imports: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let modules = imports_in_source(&src, file)?;
    debug!("Found {} imports in {}", modules.len(), file.display());
    cache.insert(file_buf, modules.clone());
    Ok(modules)
}

/// Parse Python source and list the top-level modules it imports.
///
/// Relative imports (`from . import x`, `from ..pkg import y`) name the
/// project's own code and are skipped. `import a.b.c` and `from a.b import c`
/// both yield `a`.
pub fn imports_in_source(source: &str, path: &Path) -> Result<Vec<String>> {
    let suite = ast::Suite::parse(source, &path.to_string_lossy())
        .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

    let mut modules = Vec::new();
    // Explicit stack: nesting depth of the source is unbounded.
    let mut pending: Vec<&ast::Stmt> = suite.iter().rev().collect();
    while let Some(stmt) = pending.pop() {
        let mut nested: Vec<&[ast::Stmt]> = Vec::new();
        match stmt {
            ast::Stmt::Import(ast::StmtImport { names, .. }) => {
                for alias in names {
                    trace!("Found import: '{}'", alias.name.as_str());
                    modules.push(top_level(alias.name.as_str()));
                }
            }
            ast::Stmt::ImportFrom(ast::StmtImportFrom { module, level, .. }) => {
                let relative = level.as_ref().is_some_and(|l| l.to_u32() > 0);
                match module {
                    Some(module) if !relative => {
                        trace!("Found import from: '{}'", module.as_str());
                        modules.push(top_level(module.as_str()));
                    }
                    _ => trace!("Skipping relative import in {}", path.display()),
                }
            }
            ast::Stmt::FunctionDef(ast::StmtFunctionDef { body, .. })
            | ast::Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef { body, .. })
            | ast::Stmt::ClassDef(ast::StmtClassDef { body, .. })
            | ast::Stmt::With(ast::StmtWith { body, .. })
            | ast::Stmt::AsyncWith(ast::StmtAsyncWith { body, .. }) => nested.push(body),
            ast::Stmt::For(ast::StmtFor { body, orelse, .. })
            | ast::Stmt::AsyncFor(ast::StmtAsyncFor { body, orelse, .. })
            | ast::Stmt::While(ast::StmtWhile { body, orelse, .. })
            | ast::Stmt::If(ast::StmtIf { body, orelse, .. }) => {
                nested.push(body);
                nested.push(orelse);
            }
            ast::Stmt::Try(ast::StmtTry { body, handlers, orelse, finalbody, .. })
            | ast::Stmt::TryStar(ast::StmtTryStar { body, handlers, orelse, finalbody, .. }) => {
                nested.push(body);
                for handler in handlers {
                    let ast::ExceptHandler::ExceptHandler(ast::ExceptHandlerExceptHandler {
                        body,
                        ..
                    }) = handler;
                    nested.push(body);
                }
                nested.push(orelse);
                nested.push(finalbody);
            }
            ast::Stmt::Match(ast::StmtMatch { cases, .. }) => {
                for case in cases {
                    nested.push(&case.body);
                }
            }
            // Statements that cannot contain other statements. Expressions
            // never contain statements, so they are not descended. No
            // wildcard arm: a new statement kind must be classified here.
            ast::Stmt::Return(_)
            | ast::Stmt::Delete(_)
            | ast::Stmt::Assign(_)
            | ast::Stmt::TypeAlias(_)
            | ast::Stmt::AugAssign(_)
            | ast::Stmt::AnnAssign(_)
            | ast::Stmt::Raise(_)
            | ast::Stmt::Assert(_)
            | ast::Stmt::Global(_)
            | ast::Stmt::Nonlocal(_)
            | ast::Stmt::Expr(_)
            | ast::Stmt::Pass(_)
            | ast::Stmt::Break(_)
            | ast::Stmt::Continue(_) => {}
        }
        for block in nested.into_iter().rev() {
            pending.extend(block.iter().rev());
        }
    }
    Ok(modules)
}

fn top_level(dotted: &str) -> String {
    dotted.split('.').next().unwrap_or(dotted).to_string()
}
