//! Bundle inputs, outputs and their validation.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MANIFEST_FILE, NODE_MODULES_DIR, VERSIONS_DIR};
use crate::graph::FileNode;
use crate::resolve::PackageIdentity;
use crate::util::hash::ContentHash;

/// Longest package name the registry accepts.
const MAX_PACKAGE_NAME_LEN: usize = 214;

#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("entry {} does not exist", .0.display())]
  EntryNotFound(PathBuf),
  #[error("entry {} is not a file", .0.display())]
  EntryNotFile(PathBuf),
  #[error("root directory {} does not exist or is not a directory", .0.display())]
  RootNotDirectory(PathBuf),
  #[error("entry {} lies outside root directory {}", entry.display(), root.display())]
  EntryOutsideRoot { entry: PathBuf, root: PathBuf },
  #[error("invalid deployment prefix '{prefix}': {reason}")]
  InvalidPrefix { prefix: String, reason: String },
  #[error("invalid asset name '{name}': {reason}")]
  InvalidAssetName { name: String, reason: String },
  #[error("asset '{name}' collides with deployed file '{deployment_path}'")]
  AssetCollision { name: String, deployment_path: String },
  #[error("invalid excluded package name '{name}': {reason}")]
  InvalidExclusion { name: String, reason: String },
  #[error("cannot load options from {}: {reason}", path.display())]
  OptionsFile { path: PathBuf, reason: String },
}

/// Caller-supplied bundle options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleOptions {
  pub entry_path: PathBuf,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root_directory: Option<PathBuf>,
  #[serde(default)]
  pub exclusion_set: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deployment_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub additional_assets: BTreeMap<String, String>,
  /// Defaults to `<dir(entry)>/dist/<basename(entry)>`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub staging_root: Option<PathBuf>,
}

impl BundleOptions {
  pub fn new(entry_path: impl Into<PathBuf>) -> Self {
    Self {
      entry_path: entry_path.into(),
      ..Default::default()
    }
  }

  /// Load options from a JSON file.
  pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
    let invalid = |reason: String| ValidationError::OptionsFile {
      path: path.to_path_buf(),
      reason,
    };
    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
  }

  pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.root_directory = Some(root.into());
    self
  }

  pub fn with_exclusions<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.exclusion_set.extend(names.into_iter().map(Into::into));
    self
  }

  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.deployment_prefix = Some(prefix.into());
    self
  }

  pub fn with_asset(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
    self.additional_assets.insert(name.into(), content.into());
    self
  }

  pub fn with_staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
    self.staging_root = Some(dir.into());
    self
  }

  /// Check every caller-supplied identifier and resolve defaults.
  pub fn validate(&self) -> Result<ResolvedOptions, ValidationError> {
    if !self.entry_path.exists() {
      return Err(ValidationError::EntryNotFound(self.entry_path.clone()));
    }
    if !self.entry_path.is_file() {
      return Err(ValidationError::EntryNotFile(self.entry_path.clone()));
    }
    let entry = dunce::canonicalize(&self.entry_path).map_err(|_| ValidationError::EntryNotFound(self.entry_path.clone()))?;
    let entry_dir = entry.parent().map(Path::to_path_buf).unwrap_or_default();

    let root = match &self.root_directory {
      Some(root) if root.is_dir() => {
        dunce::canonicalize(root).map_err(|_| ValidationError::RootNotDirectory(root.clone()))?
      }
      Some(root) => return Err(ValidationError::RootNotDirectory(root.clone())),
      None => entry_dir.clone(),
    };
    if !entry.starts_with(&root) {
      return Err(ValidationError::EntryOutsideRoot { entry, root });
    }

    let prefix = match &self.deployment_prefix {
      Some(prefix) => Some(validate_prefix(prefix)?),
      None => None,
    };
    for name in self.additional_assets.keys() {
      validate_asset_name(name)?;
    }
    let mut exclusions = HashSet::new();
    for name in &self.exclusion_set {
      validate_package_name(name)?;
      exclusions.insert(name.clone());
    }

    let entry_name = entry
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let staging_root = match &self.staging_root {
      Some(dir) => dir.clone(),
      None => entry_dir.join("dist").join(&entry_name),
    };

    Ok(ResolvedOptions {
      entry,
      entry_name,
      root,
      exclusions,
      prefix,
      assets: self.additional_assets.clone(),
      staging_root,
    })
  }
}

/// Options after validation, with defaults filled in and paths canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
  pub entry: PathBuf,
  /// File name of the entry, used as the package name.
  pub entry_name: String,
  pub root: PathBuf,
  pub exclusions: HashSet<String>,
  /// Normalized prefix without trailing slash.
  pub prefix: Option<String>,
  pub assets: BTreeMap<String, String>,
  pub staging_root: PathBuf,
}

impl ResolvedOptions {
  /// Directory the deployed files, descriptor and assets are written to.
  pub fn package_dir(&self) -> PathBuf {
    match &self.prefix {
      Some(prefix) => self.staging_root.join(prefix),
      None => self.staging_root.clone(),
    }
  }
}

/// What a build produced, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOutput {
  pub artifact_path: PathBuf,
  pub digest: ContentHash,
  pub cache_hit: bool,
  /// Deployment path of the entry file within the package directory. The
  /// entry keeps its source path, so a handler in `src/handler.ts` is
  /// addressed as `src/handler.<export>`, not `index.<export>`.
  #[serde(default)]
  pub entry_point: String,
  pub discovered_files: Vec<FileNode>,
  /// Every external reference seen, including excluded ones.
  pub discovered_modules: Vec<PackageIdentity>,
}

fn segment_error(segment: &str) -> Option<String> {
  if segment.is_empty() {
    return Some("empty path segment".to_string());
  }
  if segment == "." || segment == ".." {
    return Some(format!("'{}' segments are not allowed", segment));
  }
  if let Some(c) = segment
    .chars()
    .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
  {
    return Some(format!("character '{}' is not allowed", c));
  }
  None
}

fn relative_path_error(value: &str) -> Option<String> {
  if value.is_empty() {
    return Some("must not be empty".to_string());
  }
  if value.starts_with('/') || Path::new(value).components().any(|c| matches!(c, Component::Prefix(_))) {
    return Some("must be relative".to_string());
  }
  value.split('/').find_map(segment_error)
}

fn validate_prefix(prefix: &str) -> Result<String, ValidationError> {
  let invalid = |reason: String| ValidationError::InvalidPrefix {
    prefix: prefix.to_string(),
    reason,
  };
  let trimmed = if prefix.starts_with('/') {
    prefix
  } else {
    prefix.trim_end_matches('/')
  };
  if let Some(reason) = relative_path_error(trimmed) {
    return Err(invalid(reason));
  }
  if trimmed.split('/').next() == Some(VERSIONS_DIR) {
    return Err(invalid(format!("'{}' is reserved for archives", VERSIONS_DIR)));
  }
  Ok(trimmed.to_string())
}

fn validate_asset_name(name: &str) -> Result<(), ValidationError> {
  let invalid = |reason: String| ValidationError::InvalidAssetName {
    name: name.to_string(),
    reason,
  };
  if let Some(reason) = relative_path_error(name) {
    return Err(invalid(reason));
  }
  if name == MANIFEST_FILE {
    return Err(invalid(format!("collides with the generated {}", MANIFEST_FILE)));
  }
  match name.split('/').next() {
    Some(VERSIONS_DIR) => Err(invalid(format!("'{}' is reserved for archives", VERSIONS_DIR))),
    Some(NODE_MODULES_DIR) => Err(invalid(format!("'{}' is owned by the installer", NODE_MODULES_DIR))),
    _ => Ok(()),
  }
}

/// `name` or `@scope/name`, lowercase, at most 214 characters.
pub fn validate_package_name(name: &str) -> Result<(), ValidationError> {
  let invalid = |reason: &str| ValidationError::InvalidExclusion {
    name: name.to_string(),
    reason: reason.to_string(),
  };
  if name.is_empty() {
    return Err(invalid("must not be empty"));
  }
  if name.len() > MAX_PACKAGE_NAME_LEN {
    return Err(invalid("longer than 214 characters"));
  }
  if name.chars().any(char::is_whitespace) {
    return Err(invalid("contains whitespace"));
  }
  if name.chars().any(|c| c.is_ascii_uppercase()) {
    return Err(invalid("contains uppercase letters"));
  }
  let bare = match name.strip_prefix('@') {
    Some(scoped) => match scoped.split_once('/') {
      Some((scope, pkg)) if !scope.is_empty() && !pkg.is_empty() && !pkg.contains('/') => pkg,
      _ => return Err(invalid("scoped names must look like @scope/name")),
    },
    None if name.contains('/') => return Err(invalid("unscoped names cannot contain '/'")),
    None => name,
  };
  if bare.starts_with('.') || bare.starts_with('_') {
    return Err(invalid("cannot start with '.' or '_'"));
  }
  Ok(())
}
