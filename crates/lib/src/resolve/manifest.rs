//! Package descriptor lookup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::ResolveError;
use crate::consts::MANIFEST_FILE;

/// Name and version of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
  pub name: String,
  pub version: String,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
  name: Option<String>,
  version: Option<String>,
}

/// Directories to search, starting at `path` itself when it is a directory.
fn search_dirs(path: &Path) -> impl Iterator<Item = &Path> {
  let start = if path.is_dir() { Some(path) } else { path.parent() };
  start.into_iter().flat_map(Path::ancestors)
}

/// Nearest directory at or above `path` holding a package descriptor.
pub fn find_package_dir(path: &Path) -> Option<PathBuf> {
  search_dirs(path)
    .find(|dir| dir.join(MANIFEST_FILE).is_file())
    .map(Path::to_path_buf)
}

/// Identity of the nearest enclosing package.
///
/// Walks upward from `path`. Descriptors without a `name` (such as the
/// `{"type": "module"}` markers found inside build output folders) are
/// skipped.
pub fn resolve_manifest(path: &Path) -> Result<PackageIdentity, ResolveError> {
  for dir in search_dirs(path) {
    let descriptor_path = dir.join(MANIFEST_FILE);
    if !descriptor_path.is_file() {
      continue;
    }

    let content = fs::read_to_string(&descriptor_path).map_err(|e| ResolveError::ManifestLookup {
      path: descriptor_path.clone(),
      reason: e.to_string(),
    })?;
    let descriptor: Descriptor = serde_json::from_str(&content).map_err(|e| ResolveError::ManifestLookup {
      path: descriptor_path.clone(),
      reason: format!("malformed descriptor: {}", e),
    })?;

    let Some(name) = descriptor.name else {
      trace!(path = %descriptor_path.display(), "skipping unnamed descriptor");
      continue;
    };
    let version = descriptor.version.ok_or_else(|| ResolveError::ManifestLookup {
      path: descriptor_path.clone(),
      reason: format!("package '{}' declares no version", name),
    })?;

    return Ok(PackageIdentity { name, version });
  }

  Err(ResolveError::ManifestLookup {
    path: path.to_path_buf(),
    reason: "no enclosing package descriptor".to_string(),
  })
}
