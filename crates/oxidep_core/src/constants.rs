//! Names and file patterns shared by the collector, parser and distribution index.

/// Extensions of Python source files that are scanned for imports.
pub const PYTHON_EXTENSIONS: &[&str] = &["py"];

/// Extensions of compiled extension modules that can sit at a distribution root.
pub const EXTENSION_MODULE_SUFFIXES: &[&str] = &["so", "pyd"];

/// Modules that ship with the runtime without being standard library.
pub const BUNDLED_MODULES: &[&str] = &["setuptools", "pkg_resources"];

/// `from __future__ import ...` is a compiler directive, never a dependency.
pub const FUTURE_MODULE: &str = "__future__";

/// Suffixes of installed-distribution metadata entries in a site directory.
pub const DIST_INFO_SUFFIX: &str = ".dist-info";
pub const EGG_INFO_SUFFIX: &str = ".egg-info";

/// Directories that can never be imported as top-level modules.
pub const NON_MODULE_DIRS: &[&str] = &["__pycache__"];
