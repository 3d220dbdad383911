//! Import specifier classification.

use std::path::{Path, PathBuf};

use tracing::trace;

use super::ResolveError;
use super::builtins::is_builtin;
use crate::consts::{MANIFEST_FILE, NODE_MODULES_DIR};

/// What an import specifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
  /// A local source file, as a canonical absolute path.
  Local(PathBuf),
  /// An installed third-party package.
  External { name: String, package_dir: PathBuf },
  /// Provided by the platform; never installed.
  BuiltIn,
}

/// True for specifiers that name a file rather than a package.
pub fn is_local_specifier(specifier: &str) -> bool {
  specifier == "."
    || specifier == ".."
    || specifier.starts_with("./")
    || specifier.starts_with("../")
    || specifier.starts_with('/')
}

/// Package portion of a bare specifier (`name` or `@scope/name`).
pub fn package_name(specifier: &str) -> &str {
  let mut boundaries = specifier.match_indices('/').map(|(i, _)| i);
  let end = if specifier.starts_with('@') {
    boundaries.nth(1)
  } else {
    boundaries.next()
  };
  match end {
    Some(i) => &specifier[..i],
    None => specifier,
  }
}

/// Source-extension siblings tried before the literal specifier.
fn source_alternatives(path: &Path) -> Vec<PathBuf> {
  let ext = path.extension().and_then(|e| e.to_str());
  let swapped = match ext {
    Some("js") => Some("ts"),
    Some("mjs") => Some("mts"),
    Some("cjs") => Some("cts"),
    _ => None,
  };

  let mut candidates = Vec::new();
  if let Some(source_ext) = swapped {
    candidates.push(path.with_extension(source_ext));
    candidates.push(path.to_path_buf());
  } else if ext.is_some() && path.is_file() {
    candidates.push(path.to_path_buf());
  } else {
    candidates.push(path.to_path_buf());
    for suffix in ["ts", "js", "mjs"] {
      let mut with_ext = path.as_os_str().to_owned();
      with_ext.push(".");
      with_ext.push(suffix);
      candidates.push(PathBuf::from(with_ext));
    }
    candidates.push(path.join("index.ts"));
    candidates.push(path.join("index.js"));
  }
  candidates
}

fn resolve_local(specifier: &str, base_dir: &Path) -> Option<PathBuf> {
  let joined = base_dir.join(specifier);
  source_alternatives(&joined)
    .into_iter()
    .find(|candidate| candidate.is_file())
    .and_then(|found| dunce::canonicalize(found).ok())
}

fn resolve_installed(name: &str, base_dir: &Path) -> Option<PathBuf> {
  base_dir
    .ancestors()
    .map(|dir| dir.join(NODE_MODULES_DIR).join(name))
    .find(|candidate| candidate.join(MANIFEST_FILE).is_file())
    .and_then(|found| dunce::canonicalize(found).ok())
}

/// Classify `specifier` as seen from a file in `base_dir`.
///
/// Local specifiers must map to an existing file; bare specifiers that are
/// not built-ins must be installed in a `node_modules` directory at or
/// above `base_dir`.
pub fn resolve_module(specifier: &str, base_dir: &Path) -> Result<ModuleKind, ResolveError> {
  let unresolved = || ResolveError::UnresolvedImport {
    specifier: specifier.to_string(),
    importer: base_dir.to_path_buf(),
  };

  if is_local_specifier(specifier) {
    let path = resolve_local(specifier, base_dir).ok_or_else(unresolved)?;
    trace!(specifier, path = %path.display(), "resolved local module");
    return Ok(ModuleKind::Local(path));
  }

  if is_builtin(specifier) {
    return Ok(ModuleKind::BuiltIn);
  }

  let name = package_name(specifier);
  let package_dir = resolve_installed(name, base_dir).ok_or_else(unresolved)?;
  trace!(specifier, package = %package_dir.display(), "resolved external module");
  Ok(ModuleKind::External {
    name: name.to_string(),
    package_dir,
  })
}
