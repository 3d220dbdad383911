//! Effectful phase: stage, check the cache, install and archive.

use std::fs;
use std::io::Write;
use std::path::{Component, Path};
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::BundleError;
use super::plan::BundlePlan;
use super::types::BundleOutput;
use crate::archive::Archiver;
use crate::consts::{ARCHIVE_TIMESTAMP, MANIFEST_FILE, NODE_MODULES_DIR, VERSIONS_DIR};
use crate::install::DependencyInstaller;
use crate::platform::Platform;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BundleError + '_ {
  move |source| BundleError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// Remove everything in `dir` except the entries named in `keep`.
fn clear_dir(dir: &Path, keep: &[&str]) -> Result<(), BundleError> {
  if !dir.exists() {
    return Ok(());
  }
  for entry in fs::read_dir(dir).map_err(io_err(dir))? {
    let entry = entry.map_err(io_err(dir))?;
    let name = entry.file_name();
    if keep.iter().any(|k| name == *k) {
      continue;
    }
    let path = entry.path();
    let file_type = entry.file_type().map_err(io_err(&path))?;
    if file_type.is_dir() {
      fs::remove_dir_all(&path).map_err(io_err(&path))?;
    } else {
      fs::remove_file(&path).map_err(io_err(&path))?;
    }
  }
  Ok(())
}

/// Clear files left by earlier builds.
///
/// Keeps `versions/` at the staging root and the installed `node_modules/`
/// in the package directory.
pub fn clear_staging(staging_root: &Path, prefix: Option<&str>) -> Result<(), BundleError> {
  let segments: Vec<String> = prefix
    .map(|p| {
      Path::new(p)
        .components()
        .filter_map(|c| match c {
          Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
          _ => None,
        })
        .collect()
    })
    .unwrap_or_default();

  let mut dir = staging_root.to_path_buf();
  let mut keep: Vec<&str> = vec![VERSIONS_DIR];
  for segment in &segments {
    keep.push(segment);
    clear_dir(&dir, &keep)?;
    dir.push(segment);
    keep.clear();
  }
  keep.push(NODE_MODULES_DIR);
  clear_dir(&dir, &keep)
}

fn write_staged(path: &Path, content: &[u8]) -> Result<(), BundleError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(io_err(parent))?;
  }
  fs::write(path, content).map_err(io_err(path))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), BundleError> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_err(path))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), BundleError> {
  Ok(())
}

/// Write every planned file into the staging directory.
pub fn stage(plan: &BundlePlan) -> Result<(), BundleError> {
  let options = &plan.options;
  clear_staging(&options.staging_root, options.prefix.as_deref())?;

  let package_dir = options.package_dir();
  for (node, source) in plan.discovery.files() {
    let target = package_dir.join(&node.deployment_path);
    debug!(path = %target.display(), "staging file");
    write_staged(&target, source.as_bytes())?;
  }
  write_staged(&package_dir.join(MANIFEST_FILE), &plan.manifest_bytes)?;
  for (name, content) in &options.assets {
    let target = package_dir.join(name);
    write_staged(&target, content.as_bytes())?;
    if content.starts_with("#!") {
      mark_executable(&target)?;
    }
  }
  Ok(())
}

/// Stage the plan and, on a cache miss, install dependencies and archive.
pub fn realize(
  plan: &BundlePlan,
  installer: &dyn DependencyInstaller,
  archiver: &dyn Archiver,
) -> Result<BundleOutput, BundleError> {
  stage(plan)?;

  let artifact = plan.artifact_path();
  let output = |cache_hit| BundleOutput {
    artifact_path: artifact.clone(),
    digest: plan.digest.clone(),
    cache_hit,
    entry_point: plan.entry_point().to_string(),
    discovered_files: plan.discovered_files(),
    discovered_modules: plan.discovered_modules().to_vec(),
  };

  if artifact.exists() {
    info!(artifact = %artifact.display(), "cache hit, skipping install and archive");
    return Ok(output(true));
  }

  let started = Instant::now();
  let options = &plan.options;
  installer.install(&options.package_dir(), Platform::deployment_target())?;
  let exclude_versions = |rel: &Path| rel.starts_with(VERSIONS_DIR);
  let bytes = archiver.archive(&options.staging_root, &exclude_versions, ARCHIVE_TIMESTAMP)?;

  let versions = options.staging_root.join(VERSIONS_DIR);
  fs::create_dir_all(&versions).map_err(io_err(&versions))?;
  let mut temp = NamedTempFile::new_in(&versions).map_err(io_err(&versions))?;
  temp.write_all(&bytes).map_err(io_err(temp.path()))?;
  temp.persist(&artifact).map_err(|e| BundleError::Io {
    path: artifact.clone(),
    source: e.error,
  })?;

  let elapsed = humantime::format_duration(std::time::Duration::from_millis(started.elapsed().as_millis() as u64));
  info!(artifact = %artifact.display(), size = bytes.len(), elapsed = %elapsed, "install and archive complete");
  Ok(output(false))
}
