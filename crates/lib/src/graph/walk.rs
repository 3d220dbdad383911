//! FIFO import graph walk.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use super::{DiscoveryGraph, FileNode, PathCollision};
use crate::layout::{include_path, plan_location};
use crate::resolve::{ModuleKind, PackageIdentity, ResolveError, resolve_manifest, resolve_module};
use crate::source::{ParseError, scan};

#[derive(Debug, Error)]
pub enum WalkError {
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error(transparent)]
  Resolve(#[from] ResolveError),
  #[error(transparent)]
  Collision(#[from] PathCollision),
}

/// Result of processing one file. Nothing here has been applied to the graph.
#[derive(Debug)]
pub struct FileOutcome {
  pub rewritten: String,
  /// Local files referenced, with the deployment path each would get.
  pub targets: Vec<(PathBuf, String)>,
  pub modules: Vec<PackageIdentity>,
}

/// Everything reached from an entry file.
#[derive(Debug)]
pub struct Discovery {
  pub graph: DiscoveryGraph,
  /// Rewritten sources, in the same order as `graph.files()`.
  pub sources: Vec<String>,
  /// External references in encounter order, duplicates included.
  pub modules: Vec<PackageIdentity>,
}

impl Discovery {
  pub fn files(&self) -> impl Iterator<Item = (&FileNode, &str)> {
    self.graph.files().zip(self.sources.iter().map(String::as_str))
  }
}

/// Rewrite one already-read source file.
///
/// Relative specifiers are rewritten to include paths between deployment
/// paths. Bare specifiers that are not built-ins are resolved to the
/// identity of the installed package and left as written.
pub fn process_source(
  source: &str,
  location: &Path,
  deployment_path: &str,
  root: &Path,
  graph: &DiscoveryGraph,
) -> Result<FileOutcome, WalkError> {
  let scanned = scan(source, location)?;
  let base_dir = location.parent().unwrap_or(Path::new("/"));

  let mut specifiers = HashMap::new();
  let mut targets = Vec::new();
  let mut modules = Vec::new();
  for module_ref in scanned.refs() {
    match resolve_module(&module_ref.specifier, base_dir).map_err(|e| with_importer(e, location))? {
      ModuleKind::Local(target) => {
        let target_path = match graph.get(&target) {
          Some(node) => node.deployment_path.clone(),
          None => plan_location(&target, root)?,
        };
        specifiers.insert(module_ref.literal.0, include_path(deployment_path, &target_path));
        targets.push((target, target_path));
      }
      ModuleKind::External { name, package_dir } => {
        let identity = resolve_manifest(&package_dir)?;
        trace!(specifier = %module_ref.specifier, package = %name, version = %identity.version, "external module");
        modules.push(identity);
      }
      ModuleKind::BuiltIn => {
        trace!(specifier = %module_ref.specifier, "built-in module");
      }
    }
  }

  Ok(FileOutcome {
    rewritten: scanned.render(&specifiers),
    targets,
    modules,
  })
}

/// Read and rewrite the file at `location`.
pub fn process_file(
  location: &Path,
  deployment_path: &str,
  root: &Path,
  graph: &DiscoveryGraph,
) -> Result<FileOutcome, WalkError> {
  let source = fs::read_to_string(location).map_err(|source| ParseError::Unreadable {
    path: location.to_path_buf(),
    source,
  })?;
  process_source(&source, location, deployment_path, root, graph)
}

fn with_importer(err: ResolveError, importer: &Path) -> ResolveError {
  match err {
    ResolveError::UnresolvedImport { specifier, .. } => ResolveError::UnresolvedImport {
      specifier,
      importer: importer.to_path_buf(),
    },
    other => other,
  }
}

/// Walk the local import graph from `entry` in FIFO order.
///
/// A file is registered before it is queued, so cycles and repeated imports
/// resolve to the existing node instead of being processed again.
pub fn discover_and_rewrite(entry: &Path, root: &Path) -> Result<Discovery, WalkError> {
  let canonical = |path: &Path| {
    dunce::canonicalize(path).map_err(|source| ParseError::Unreadable {
      path: path.to_path_buf(),
      source,
    })
  };
  let entry = canonical(entry)?;
  let root = canonical(root)?;

  let mut graph = DiscoveryGraph::new();
  let entry_path = plan_location(&entry, &root)?;
  let (entry_idx, _) = graph.register(&entry, &entry_path)?;

  let mut queue = VecDeque::from([entry_idx]);
  let mut sources = Vec::new();
  let mut modules = Vec::new();

  while let Some(idx) = queue.pop_front() {
    let node = graph.node(idx).clone();
    debug!(path = %node.location.display(), deployment = %node.deployment_path, "processing file");
    let outcome = process_file(&node.location, &node.deployment_path, &root, &graph)?;

    for (target, deployment_path) in outcome.targets {
      let (target_idx, is_new) = graph.register(&target, &deployment_path)?;
      graph.link(idx, target_idx);
      if is_new {
        queue.push_back(target_idx);
      }
    }
    modules.extend(outcome.modules);
    sources.push(outcome.rewritten);
  }

  debug!(files = graph.len(), modules = modules.len(), "discovery complete");
  Ok(Discovery { graph, sources, modules })
}
