//! Module and package descriptor resolution.
//!
//! - [`resolve_module`] classifies an import specifier as a local file, an
//!   installed external package, or a platform built-in.
//! - [`resolve_manifest`] reads the identity of the nearest enclosing package.

mod builtins;
mod manifest;
mod module;

use std::path::PathBuf;

use thiserror::Error;

pub use builtins::{NODE_BUILTINS, PLATFORM_PROVIDED, is_builtin};
pub use manifest::{PackageIdentity, find_package_dir, resolve_manifest};
pub use module::{ModuleKind, is_local_specifier, package_name, resolve_module};

/// Errors raised while mapping specifiers and locating package descriptors.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// A local specifier has no matching file, or a package is not installed.
  #[error("cannot resolve '{specifier}' imported from {}", importer.display())]
  UnresolvedImport { specifier: String, importer: PathBuf },

  /// No usable package descriptor encloses the path.
  #[error("package descriptor lookup failed for {}: {reason}", path.display())]
  ManifestLookup { path: PathBuf, reason: String },
}
