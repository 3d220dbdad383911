//! Package descriptor written next to the deployed files.
//!
//! # Determinism
//!
//! Fields serialize in declaration order and dependencies live in a
//! [`BTreeMap`], so identical inputs always produce identical bytes.
//!
//! # Example
//!
//! ```json
//! {
//!   "name": "handler.ts",
//!   "version": "1.0.0",
//!   "description": "Serverless function bundle",
//!   "exports": "./handler.js",
//!   "type": "module",
//!   "engines": { "node": ">=18.0.0" },
//!   "dependencies": { "left-pad": "1.3.0" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Runtime version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engines {
  pub node: String,
}

/// The descriptor installed and archived with a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
  pub name: String,
  pub version: String,
  pub description: String,
  /// Entry point, relative to the package directory.
  pub exports: String,
  /// Module system marker.
  #[serde(rename = "type")]
  pub module_type: String,
  pub engines: Engines,
  pub dependencies: BTreeMap<String, String>,
}
