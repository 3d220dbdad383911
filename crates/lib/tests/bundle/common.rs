//! Shared helpers for bundle integration tests.

use std::cell::Cell;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use fnpack_lib::archive::{ArchiveError, Archiver, Timestamp, ZipArchiver};
use fnpack_lib::install::{DependencyInstaller, InstallError};
use fnpack_lib::platform::Platform;
use tempfile::TempDir;

/// Installer that records calls instead of running a package manager.
#[derive(Default)]
pub struct CountingInstaller {
  pub calls: Cell<usize>,
}

impl DependencyInstaller for CountingInstaller {
  fn install(&self, dir: &Path, platform: Platform) -> Result<(), InstallError> {
    assert!(dir.is_dir(), "installer ran before staging");
    assert_eq!(platform, Platform::deployment_target());
    self.calls.set(self.calls.get() + 1);
    Ok(())
  }
}

/// Real zip archiver that also counts invocations.
#[derive(Default)]
pub struct CountingArchiver {
  pub calls: Cell<usize>,
}

impl Archiver for CountingArchiver {
  fn archive(&self, dir: &Path, exclude: &dyn Fn(&Path) -> bool, timestamp: Timestamp) -> Result<Vec<u8>, ArchiveError> {
    self.calls.set(self.calls.get() + 1);
    ZipArchiver.archive(dir, exclude, timestamp)
  }
}

/// A source tree in a temporary directory.
pub struct Project {
  pub temp: TempDir,
  pub root: PathBuf,
}

impl Project {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    Self { temp, root }
  }

  /// Write a file relative to the project root.
  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.root.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Install a fake package under `node_modules/<name>`.
  pub fn install(&self, name: &str, version: &str) {
    self.write(
      &format!("node_modules/{}/package.json", name),
      &format!(r#"{{ "name": "{}", "version": "{}" }}"#, name, version),
    );
    self.write(&format!("node_modules/{}/index.js", name), "export default () => {};\n");
  }
}

/// Sorted entry names of an archive on disk.
pub fn archive_entries(path: &Path) -> Vec<String> {
  let bytes = std::fs::read(path).unwrap();
  let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
  let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
  names.sort();
  names
}

/// Read one archive entry as text.
pub fn archive_text(path: &Path, name: &str) -> String {
  use std::io::Read;
  let bytes = std::fs::read(path).unwrap();
  let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
  let mut file = archive.by_name(name).unwrap();
  let mut content = String::new();
  file.read_to_string(&mut content).unwrap();
  content
}
