//! Package descriptor builder.

mod types;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

pub use types::{Engines, PackageManifest};

use crate::consts::{BUNDLE_DESCRIPTION, BUNDLE_VERSION, MIN_NODE_VERSION, MODULE_TYPE};
use crate::resolve::PackageIdentity;

/// Fold external references into a descriptor.
///
/// Duplicate names resolve last-write-wins in encounter order; a conflicting
/// version is logged. Names in `exclusions` are then removed. `entry_point`
/// is the entry file's deployment path.
pub fn build_manifest(
  entry_name: &str,
  entry_point: &str,
  refs: &[PackageIdentity],
  exclusions: &HashSet<String>,
) -> PackageManifest {
  let mut dependencies = BTreeMap::new();
  for module in refs {
    if let Some(previous) = dependencies.insert(module.name.clone(), module.version.clone())
      && previous != module.version
    {
      warn!(
        package = %module.name,
        previous = %previous,
        version = %module.version,
        "conflicting versions discovered, keeping the last"
      );
    }
  }
  dependencies.retain(|name, _| {
    let keep = !exclusions.contains(name);
    if !keep {
      debug!(package = %name, "excluded from manifest");
    }
    keep
  });

  PackageManifest {
    name: entry_name.to_string(),
    version: BUNDLE_VERSION.to_string(),
    description: BUNDLE_DESCRIPTION.to_string(),
    exports: format!("./{}", entry_point),
    module_type: MODULE_TYPE.to_string(),
    engines: Engines {
      node: MIN_NODE_VERSION.to_string(),
    },
    dependencies,
  }
}

impl PackageManifest {
  /// Serialized descriptor bytes, pretty-printed with a stable key order.
  pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(self)
  }
}
