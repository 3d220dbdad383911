//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated project directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Canonical project root.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Install a fake package under `node_modules/<name>`.
  pub fn install_package(&self, name: &str, version: &str) {
    self.write_file(
      &format!("node_modules/{}/package.json", name),
      &format!(r#"{{ "name": "{}", "version": "{}" }}"#, name, version),
    );
    self.write_file(&format!("node_modules/{}/index.js", name), "export default {};\n");
  }

  /// fnpack command whose installer only records that it ran.
  pub fn fnpack_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("fnpack");
    cmd.current_dir(self.root());
    cmd.env("FNPACK_INSTALL_CMD", "echo installed >> install.log");
    cmd.env_remove("FNPACK_SHELL");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Run a command with JSON output and parse stdout.
  pub fn json(&self, cmd: &mut Command) -> serde_json::Value {
    let output = cmd.args(["-o", "json"]).output().unwrap();
    assert!(
      output.status.success(),
      "command failed: {}",
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}

/// Number of times the stub installer ran in `dir`.
pub fn install_count(dir: &Path) -> usize {
  std::fs::read_to_string(dir.join("install.log"))
    .map(|log| log.lines().count())
    .unwrap_or(0)
}
