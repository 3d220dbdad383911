//! Discovery graph for one build.
//!
//! Nodes are the distinct local files reached from the entry, in the order
//! they were first referenced. Edges run from importer to imported file.
//! A graph is owned by a single build and passed explicitly to each step.

mod walk;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use walk::{Discovery, FileOutcome, WalkError, discover_and_rewrite, process_file, process_source};

/// A discovered file and where it is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
  pub location: PathBuf,
  pub deployment_path: String,
}

/// Two distinct files were assigned the same deployment path.
#[derive(Debug, Error)]
#[error("{} and {} both deploy to '{deployment_path}'", first.display(), second.display())]
pub struct PathCollision {
  pub deployment_path: String,
  pub first: PathBuf,
  pub second: PathBuf,
}

#[derive(Debug, Default)]
pub struct DiscoveryGraph {
  graph: DiGraph<FileNode, ()>,
  by_location: HashMap<PathBuf, NodeIndex>,
  by_deployment: HashMap<String, NodeIndex>,
}

impl DiscoveryGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `location`, returning its node and whether it was new.
  ///
  /// An already registered location keeps its original deployment path.
  pub fn register(&mut self, location: &Path, deployment_path: &str) -> Result<(NodeIndex, bool), PathCollision> {
    if let Some(&idx) = self.by_location.get(location) {
      return Ok((idx, false));
    }
    if let Some(&other) = self.by_deployment.get(deployment_path) {
      return Err(PathCollision {
        deployment_path: deployment_path.to_string(),
        first: self.graph[other].location.clone(),
        second: location.to_path_buf(),
      });
    }

    let idx = self.graph.add_node(FileNode {
      location: location.to_path_buf(),
      deployment_path: deployment_path.to_string(),
    });
    self.by_location.insert(location.to_path_buf(), idx);
    self.by_deployment.insert(deployment_path.to_string(), idx);
    Ok((idx, true))
  }

  pub fn link(&mut self, importer: NodeIndex, target: NodeIndex) {
    if self.graph.find_edge(importer, target).is_none() {
      self.graph.add_edge(importer, target, ());
    }
  }

  pub fn get(&self, location: &Path) -> Option<&FileNode> {
    self.by_location.get(location).map(|&idx| &self.graph[idx])
  }

  pub fn index_of(&self, location: &Path) -> Option<NodeIndex> {
    self.by_location.get(location).copied()
  }

  pub fn node(&self, idx: NodeIndex) -> &FileNode {
    &self.graph[idx]
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Files in discovery order.
  pub fn files(&self) -> impl Iterator<Item = &FileNode> {
    self.graph.node_indices().map(|idx| &self.graph[idx])
  }

  /// Files directly imported by `location`.
  pub fn imports_of(&self, location: &Path) -> Vec<&FileNode> {
    let Some(idx) = self.index_of(location) else {
      return Vec::new();
    };
    let mut targets: Vec<_> = self
      .graph
      .neighbors_directed(idx, Direction::Outgoing)
      .map(|n| &self.graph[n])
      .collect();
    targets.sort_by(|a, b| a.deployment_path.cmp(&b.deployment_path));
    targets
  }
}
