//! Pure planning phase: graph, descriptor and cache key, no disk writes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use super::BundleError;
use super::types::{ResolvedOptions, ValidationError};
use crate::consts::{ARCHIVE_EXTENSION, MANIFEST_FILE, VERSIONS_DIR};
use crate::graph::{Discovery, FileNode, discover_and_rewrite};
use crate::manifest::{PackageManifest, build_manifest};
use crate::resolve::PackageIdentity;
use crate::util::hash::{BuildHasher, ContentHash};

/// Everything a build will stage, and the digest it hashes to.
#[derive(Debug)]
pub struct BundlePlan {
  pub options: ResolvedOptions,
  pub discovery: Discovery,
  pub manifest: PackageManifest,
  pub manifest_bytes: Vec<u8>,
  pub digest: ContentHash,
}

impl BundlePlan {
  /// `<stagingRoot>/versions/<digest>.zip`
  pub fn artifact_path(&self) -> PathBuf {
    self
      .options
      .staging_root
      .join(VERSIONS_DIR)
      .join(format!("{}.{}", self.digest, ARCHIVE_EXTENSION))
  }

  pub fn discovered_files(&self) -> Vec<FileNode> {
    self.discovery.graph.files().cloned().collect()
  }

  pub fn discovered_modules(&self) -> &[PackageIdentity] {
    &self.discovery.modules
  }

  /// Deployment path of the entry file, relative to the package directory.
  pub fn entry_point(&self) -> &str {
    self.manifest.exports.trim_start_matches("./")
  }
}

/// Path of a staged file relative to the staging root.
fn archive_path(prefix: Option<&str>, name: &str) -> String {
  match prefix {
    Some(prefix) => format!("{prefix}/{name}"),
    None => name.to_string(),
  }
}

/// Fold every staged file into the cache key.
///
/// `files` yields `(deployment path, source)` in processing order; the
/// descriptor follows, then assets in name order. Each file is folded with
/// its path below the staging root, so the prefix and file names are part
/// of the key.
pub fn compute_digest<'a>(
  files: impl IntoIterator<Item = (&'a str, &'a str)>,
  manifest_bytes: &[u8],
  assets: &BTreeMap<String, String>,
  prefix: Option<&str>,
) -> ContentHash {
  let mut hasher = BuildHasher::new();
  for (path, source) in files {
    hasher.update_entry(&archive_path(prefix, path), source.as_bytes());
  }
  hasher.update_entry(&archive_path(prefix, MANIFEST_FILE), manifest_bytes);
  for (name, content) in assets {
    hasher.update_entry(&archive_path(prefix, name), content.as_bytes());
  }
  debug!(segments = hasher.segments(), "digest computed");
  hasher.finalize()
}

/// Reject assets that would overwrite a deployed file or sit on its path.
fn check_asset_paths(discovery: &Discovery, assets: &BTreeMap<String, String>) -> Result<(), ValidationError> {
  for name in assets.keys() {
    let dir = format!("{name}/");
    for node in discovery.graph.files() {
      let deployed = node.deployment_path.as_str();
      if deployed == name || deployed.starts_with(&dir) || name.starts_with(&format!("{deployed}/")) {
        return Err(ValidationError::AssetCollision {
          name: name.clone(),
          deployment_path: deployed.to_string(),
        });
      }
    }
  }
  Ok(())
}

/// Walk the import graph and compute the descriptor and digest.
pub fn plan_bundle(options: ResolvedOptions) -> Result<BundlePlan, BundleError> {
  info!(entry = %options.entry.display(), root = %options.root.display(), "planning bundle");
  let discovery = discover_and_rewrite(&options.entry, &options.root)?;
  check_asset_paths(&discovery, &options.assets)?;

  let entry_point = discovery
    .graph
    .files()
    .next()
    .map(|node| node.deployment_path.clone())
    .unwrap_or_default();
  let manifest = build_manifest(&options.entry_name, &entry_point, &discovery.modules, &options.exclusions);
  let manifest_bytes = manifest.to_bytes()?;
  let files = discovery.files().map(|(node, source)| (node.deployment_path.as_str(), source));
  let digest = compute_digest(files, &manifest_bytes, &options.assets, options.prefix.as_deref());

  info!(
    files = discovery.graph.len(),
    dependencies = manifest.dependencies.len(),
    digest = %digest,
    "bundle planned"
  );
  Ok(BundlePlan {
    options,
    discovery,
    manifest,
    manifest_bytes,
    digest,
  })
}
