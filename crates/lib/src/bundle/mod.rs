//! Packaging pipeline.
//!
//! A build runs in two phases:
//!
//! 1. [`plan_bundle`] walks the import graph, builds the package descriptor
//!    and computes the cache key. It reads sources but writes nothing.
//! 2. [`realize`] stages the planned files, checks for an existing artifact
//!    under `versions/<digest>.zip` and only on a miss installs dependencies
//!    and archives the staging tree.
//!
//! [`package`] runs validation and both phases.

mod plan;
mod stage;
mod types;

use std::path::PathBuf;

use thiserror::Error;

pub use plan::{BundlePlan, compute_digest, plan_bundle};
pub use stage::{clear_staging, realize, stage};
pub use types::{BundleOptions, BundleOutput, ResolvedOptions, ValidationError, validate_package_name};

use crate::archive::{ArchiveError, Archiver};
use crate::graph::{PathCollision, WalkError};
use crate::install::{DependencyInstaller, InstallError};
use crate::resolve::ResolveError;
use crate::source::ParseError;

#[derive(Debug, Error)]
pub enum BundleError {
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error(transparent)]
  Resolve(#[from] ResolveError),
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error(transparent)]
  Install(#[from] InstallError),
  #[error(transparent)]
  Archive(#[from] ArchiveError),
  #[error(transparent)]
  PathCollision(#[from] PathCollision),
  #[error("failed to serialize package descriptor: {0}")]
  Manifest(#[from] serde_json::Error),
  #[error("{}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl From<WalkError> for BundleError {
  fn from(err: WalkError) -> Self {
    match err {
      WalkError::Parse(e) => BundleError::Parse(e),
      WalkError::Resolve(e) => BundleError::Resolve(e),
      WalkError::Collision(e) => BundleError::PathCollision(e),
    }
  }
}

/// Validate `options`, plan the bundle and realize it.
pub fn package(
  options: &BundleOptions,
  installer: &dyn DependencyInstaller,
  archiver: &dyn Archiver,
) -> Result<BundleOutput, BundleError> {
  let resolved = options.validate()?;
  let plan = plan_bundle(resolved)?;
  realize(&plan, installer, archiver)
}
