//! Deterministic archive production.
//!
//! Entries are added in sorted path order with forward-slash names, one
//! fixed modification time and normalized permissions, so the archive bytes
//! depend only on the staged tree's paths and contents.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::util::paths::to_slash;

/// Calendar time stamped on every entry: (year, month, day, hour, minute, second).
pub type Timestamp = (u16, u8, u8, u8, u8, u8);

const FILE_MODE: u32 = 0o644;
const EXEC_MODE: u32 = 0o755;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to walk {}: {source}", root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },
  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to write archive entry '{entry}': {source}")]
  Zip {
    entry: String,
    #[source]
    source: zip::result::ZipError,
  },
  #[error("timestamp {0:?} cannot be stored in an archive")]
  Timestamp(Timestamp),
}

/// Produces archive bytes from a directory tree.
pub trait Archiver {
  /// Archive `dir`. Paths for which `exclude` returns true (given relative
  /// to `dir`) are skipped along with everything beneath them.
  fn archive(&self, dir: &Path, exclude: &dyn Fn(&Path) -> bool, timestamp: Timestamp) -> Result<Vec<u8>, ArchiveError>;
}

/// Deflate-compressed zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

fn zip_time(timestamp: Timestamp) -> Result<DateTime, ArchiveError> {
  let (year, month, day, hour, minute, second) = timestamp;
  DateTime::from_date_and_time(year, month, day, hour, minute, second).map_err(|_| ArchiveError::Timestamp(timestamp))
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
  use std::os::unix::fs::PermissionsExt;
  metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
  false
}

impl Archiver for ZipArchiver {
  fn archive(&self, dir: &Path, exclude: &dyn Fn(&Path) -> bool, timestamp: Timestamp) -> Result<Vec<u8>, ArchiveError> {
    let base = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(zip_time(timestamp)?);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = 0usize;

    let walker = WalkDir::new(dir)
      .min_depth(1)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.path().strip_prefix(dir).map_or(true, |rel| !exclude(rel)));

    for entry in walker {
      let entry = entry.map_err(|source| ArchiveError::Walk {
        root: dir.to_path_buf(),
        source,
      })?;
      let path = entry.path();
      let Ok(relative) = path.strip_prefix(dir) else {
        continue;
      };
      let name = to_slash(relative);
      let zip_err = |source| ArchiveError::Zip {
        entry: name.clone(),
        source,
      };
      let read_err = |source| ArchiveError::Read {
        path: path.to_path_buf(),
        source,
      };

      let file_type = entry.file_type();
      if file_type.is_dir() {
        trace!(entry = %name, "directory");
        zip
          .add_directory(format!("{}/", name), base.unix_permissions(EXEC_MODE))
          .map_err(zip_err)?;
      } else if file_type.is_symlink() {
        let target = fs::read_link(path).map_err(read_err)?;
        trace!(entry = %name, target = %target.display(), "symlink");
        zip
          .add_symlink(name.clone(), to_slash(&target), base.unix_permissions(EXEC_MODE))
          .map_err(zip_err)?;
      } else {
        let metadata = entry.metadata().map_err(|source| ArchiveError::Walk {
          root: dir.to_path_buf(),
          source,
        })?;
        let mode = if is_executable(&metadata) { EXEC_MODE } else { FILE_MODE };
        let content = fs::read(path).map_err(read_err)?;
        trace!(entry = %name, size = content.len(), "file");
        zip.start_file(name.clone(), base.unix_permissions(mode)).map_err(zip_err)?;
        zip.write_all(&content).map_err(|e| zip_err(e.into()))?;
      }
      entries += 1;
    }

    let bytes = zip
      .finish()
      .map_err(|source| ArchiveError::Zip {
        entry: String::new(),
        source,
      })?
      .into_inner();
    debug!(dir = %dir.display(), entries, size = bytes.len(), "archive written");
    Ok(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::ARCHIVE_TIMESTAMP;
  use crate::util::testutil::write_file;
  use std::io::Read;
  use tempfile::TempDir;

  fn no_exclusions(_: &Path) -> bool {
    false
  }

  fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
  }

  fn staged_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "index.js", "export const a = 1;\n");
    write_file(temp.path(), "lib/util.js", "export const u = 2;\n");
    write_file(temp.path(), "package.json", "{}\n");
    write_file(temp.path(), "versions/old.zip", "stale");
    temp
  }

  #[test]
  fn entries_are_sorted_and_excluded() {
    let temp = staged_tree();
    let bytes = ZipArchiver
      .archive(temp.path(), &|rel: &Path| rel.starts_with("versions"), ARCHIVE_TIMESTAMP)
      .unwrap();

    let mut names = entry_names(&bytes);
    names.sort();
    assert_eq!(names, vec!["index.js", "lib/", "lib/util.js", "package.json"]);
  }

  #[test]
  fn identical_trees_give_identical_bytes() {
    let first = staged_tree();
    let second = staged_tree();
    let a = ZipArchiver.archive(first.path(), &no_exclusions, ARCHIVE_TIMESTAMP).unwrap();
    let b = ZipArchiver.archive(second.path(), &no_exclusions, ARCHIVE_TIMESTAMP).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn entries_carry_fixed_timestamp() {
    let temp = staged_tree();
    let bytes = ZipArchiver.archive(temp.path(), &no_exclusions, ARCHIVE_TIMESTAMP).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name("lib/util.js").unwrap();
    let modified = file.last_modified().unwrap();
    assert_eq!(
      (modified.year(), modified.month(), modified.day(), modified.hour(), modified.minute()),
      (2023, 11, 11, 19, 18)
    );
    assert_eq!(file.unix_mode().map(|m| m & 0o777), Some(0o644));

    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    assert_eq!(content, "export const u = 2;\n");
  }

  #[cfg(unix)]
  #[test]
  fn executables_keep_exec_mode() {
    use std::os::unix::fs::PermissionsExt;
    let temp = TempDir::new().unwrap();
    let script = write_file(temp.path(), "extension", "#!/bin/bash\n");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o700)).unwrap();

    let bytes = ZipArchiver.archive(temp.path(), &no_exclusions, ARCHIVE_TIMESTAMP).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let file = archive.by_name("extension").unwrap();
    assert_eq!(file.unix_mode().map(|m| m & 0o777), Some(0o755));
  }

  #[test]
  fn invalid_timestamp_is_rejected() {
    let temp = staged_tree();
    let err = ZipArchiver.archive(temp.path(), &no_exclusions, (1970, 1, 1, 0, 0, 0)).unwrap_err();
    assert!(matches!(err, ArchiveError::Timestamp(_)));
  }
}
