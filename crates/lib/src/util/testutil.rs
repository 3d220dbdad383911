//! Test utilities for fnpack-lib.
//!
//! Helpers for laying out small source trees and installed packages in a
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// Install a fake package under `root/node_modules/<name>`.
pub fn install_package(root: &Path, name: &str, version: &str) -> PathBuf {
  let dir = root.join("node_modules").join(name);
  write_file(
    &dir,
    "package.json",
    &format!(r#"{{ "name": "{}", "version": "{}", "main": "index.js" }}"#, name, version),
  );
  write_file(&dir, "index.js", "module.exports = {};\n");
  dir
}

/// Canonical form of a temp directory path (macOS tempdirs live behind a symlink).
pub fn canonical(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap()
}
