//! Deployment layout.
//!
//! Every discovered file gets a deployment path: its location inside the
//! packaged artifact, relative to the package directory and always written
//! with forward slashes. Files under the build root mirror their relative
//! location. Files outside it land under [`PARENT_NAMESPACE`], keyed by their
//! nearest enclosing package, so rewritten include paths never climb out of
//! the artifact.

use std::path::{Path, PathBuf};

use crate::consts::PARENT_NAMESPACE;
use crate::resolve::{ResolveError, find_package_dir};
use crate::source::output_extension;
use crate::util::paths::{escapes, normalize, relative_path, to_slash};

/// Deployment path for `location`.
///
/// `package_dir` is only consulted when `location` lies outside `root`; it
/// must then enclose `location`.
pub fn deployment_path_for(location: &Path, root: &Path, package_dir: Option<&Path>) -> Result<String, ResolveError> {
  let location = normalize(location);
  let relative = relative_path(&normalize(root), &location);
  if !escapes(&relative) {
    return Ok(with_output_extension(&to_slash(&relative)));
  }

  let package_dir = package_dir.ok_or_else(|| ResolveError::ManifestLookup {
    path: location.clone(),
    reason: "file lies outside the root directory and no enclosing package was found".to_string(),
  })?;
  let package_dir = normalize(package_dir);
  let base = package_dir.parent().unwrap_or(&package_dir);
  let inside = relative_path(base, &location);
  if escapes(&inside) {
    return Err(ResolveError::ManifestLookup {
      path: location.clone(),
      reason: format!("package directory {} does not enclose the file", package_dir.display()),
    });
  }
  Ok(with_output_extension(&format!("{}/{}", PARENT_NAMESPACE, to_slash(&inside))))
}

/// Deployment path for `location`, looking up its enclosing package when it
/// lies outside `root`.
pub fn plan_location(location: &Path, root: &Path) -> Result<String, ResolveError> {
  let relative = relative_path(&normalize(root), &normalize(location));
  if escapes(&relative) {
    let package_dir = find_package_dir(location);
    deployment_path_for(location, root, package_dir.as_deref())
  } else {
    deployment_path_for(location, root, None)
  }
}

/// Include path from the file deployed at `importer` to the one at `target`.
pub fn include_path(importer: &str, target: &str) -> String {
  let importer_dir = Path::new(importer).parent().unwrap_or(Path::new(""));
  let relative = relative_path(importer_dir, Path::new(target));
  let relative = to_slash(&relative);
  if relative.starts_with('.') {
    relative
  } else {
    format!("./{}", relative)
  }
}

fn with_output_extension(path: &str) -> String {
  let as_path = PathBuf::from(path);
  match as_path.extension().and_then(|e| e.to_str()) {
    Some(ext) => {
      let mapped = output_extension(ext);
      if mapped == ext {
        path.to_string()
      } else {
        format!("{}{}", &path[..path.len() - ext.len()], mapped)
      }
    }
    None => path.to_string(),
  }
}
