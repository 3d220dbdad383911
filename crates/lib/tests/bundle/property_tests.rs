//! Determinism, uniqueness and containment properties.

use std::collections::HashSet;

use fnpack_lib::bundle::{BundleError, BundleOptions, ValidationError, package, plan_bundle};

use super::common::{CountingArchiver, CountingInstaller, Project, archive_entries};

fn sample_tree(project: &Project) -> std::path::PathBuf {
  project.install("uuid", "9.0.1");
  project.write("util/format.ts", "export function format(v: number): string { return `${v}`; }\n");
  project.write("util/index.ts", "export * from './format.js';\n");
  project.write(
    "index.ts",
    "import { v4 } from 'uuid';\nimport { format } from './util/index.js';\nexport const id = (): string => v4() + format(1);\n",
  )
}

#[test]
fn independent_builds_are_byte_identical() {
  let first_project = Project::new();
  let second_project = Project::new();
  let first = package(
    &BundleOptions::new(sample_tree(&first_project)),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap();
  let second = package(
    &BundleOptions::new(sample_tree(&second_project)),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap();

  assert_eq!(first.digest, second.digest);
  assert_eq!(
    std::fs::read(&first.artifact_path).unwrap(),
    std::fs::read(&second.artifact_path).unwrap()
  );
}

#[test]
fn digest_ignores_file_metadata() {
  let project = Project::new();
  let entry = sample_tree(&project);
  let before = plan_bundle(BundleOptions::new(&entry).validate().unwrap()).unwrap();

  let content = std::fs::read_to_string(project.root.join("util/format.ts")).unwrap();
  std::thread::sleep(std::time::Duration::from_millis(20));
  project.write("util/format.ts", &content);
  let after = plan_bundle(BundleOptions::new(&entry).validate().unwrap()).unwrap();

  assert_eq!(before.digest, after.digest);
  assert_eq!(before.manifest_bytes, after.manifest_bytes);
}

#[test]
fn deployment_paths_are_unique() {
  let project = Project::new();
  let entry = sample_tree(&project);
  let plan = plan_bundle(BundleOptions::new(&entry).validate().unwrap()).unwrap();

  let files = plan.discovered_files();
  let unique: HashSet<_> = files.iter().map(|f| f.deployment_path.clone()).collect();
  assert_eq!(unique.len(), files.len());
}

#[test]
fn outside_root_imports_are_contained() {
  let project = Project::new();
  project.write("shared/package.json", r#"{ "name": "shared", "version": "1.0.0" }"#);
  project.write("shared/src/log.ts", "export const log = (m: string) => console.log(m);\n");
  let entry = project.write(
    "functions/api/handler.ts",
    "import { log } from '../../shared/src/log.js';\nexport const handler = () => log('hi');\n",
  );

  let options = BundleOptions::new(&entry);
  let plan = plan_bundle(options.validate().unwrap()).unwrap();

  let files = plan.discovered_files();
  assert_eq!(files[1].deployment_path, "parent/shared/src/log.js");
  let (_, rewritten) = plan.discovery.files().next().unwrap();
  assert!(rewritten.contains("'./parent/shared/src/log.js'"));
  assert!(!rewritten.contains(".."));
}

#[test]
fn colliding_outside_root_files_are_rejected() {
  let project = Project::new();
  project.write("one/lib/package.json", r#"{ "name": "lib", "version": "1.0.0" }"#);
  project.write("two/lib/package.json", r#"{ "name": "lib", "version": "2.0.0" }"#);
  project.write("one/lib/util.ts", "export const one = 1;\n");
  project.write("two/lib/util.ts", "export const two = 2;\n");
  let entry = project.write(
    "app/index.ts",
    "import { one } from '../one/lib/util.js';\nimport { two } from '../two/lib/util.js';\n",
  );

  let err = package(
    &BundleOptions::new(&entry),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap_err();
  assert!(matches!(err, BundleError::PathCollision(_)));
}

#[test]
fn exclusion_applies_to_repeated_references() {
  let project = Project::new();
  let entry = sample_tree(&project);
  project.write(
    "util/format.ts",
    "import { v4 } from 'uuid';\nexport function format(v: number): string { return v4() + v; }\n",
  );

  let plan = plan_bundle(BundleOptions::new(&entry).with_exclusions(["uuid"]).validate().unwrap()).unwrap();
  assert!(plan.manifest.dependencies.is_empty());
  assert_eq!(plan.discovered_modules().len(), 2);
}

#[test]
fn renamed_asset_is_a_new_build() {
  let project = Project::new();
  let entry = project.write("index.ts", "export const handler = () => 1;\n");
  let staging = project.root.join("out");
  let script = "#!/bin/bash\nexec \"$@\"\n";

  let installer = CountingInstaller::default();
  let archiver = CountingArchiver::default();
  let first = package(
    &BundleOptions::new(&entry).with_staging_root(&staging).with_asset("extension", script),
    &installer,
    &archiver,
  )
  .unwrap();
  let second = package(
    &BundleOptions::new(&entry).with_staging_root(&staging).with_asset("wrapper", script),
    &installer,
    &archiver,
  )
  .unwrap();

  assert_ne!(first.digest, second.digest);
  assert!(!second.cache_hit);
  assert_eq!(archive_entries(&second.artifact_path), vec!["index.js", "package.json", "wrapper"]);
}

#[test]
fn changed_prefix_is_a_new_build() {
  let project = Project::new();
  let entry = project.write("index.ts", "export const handler = () => 1;\n");
  let staging = project.root.join("out");

  let installer = CountingInstaller::default();
  let archiver = CountingArchiver::default();
  let first = package(
    &BundleOptions::new(&entry).with_staging_root(&staging).with_prefix("other"),
    &installer,
    &archiver,
  )
  .unwrap();
  let second = package(
    &BundleOptions::new(&entry).with_staging_root(&staging).with_prefix("nodejs"),
    &installer,
    &archiver,
  )
  .unwrap();

  assert_ne!(first.digest, second.digest);
  assert!(!second.cache_hit);
  assert_eq!(
    archive_entries(&second.artifact_path),
    vec!["nodejs/", "nodejs/index.js", "nodejs/package.json"]
  );
}

#[test]
fn assets_never_replace_deployed_files() {
  let project = Project::new();
  let entry = project.write("index.ts", "export const handler = () => 1;\n");

  let err = package(
    &BundleOptions::new(&entry).with_asset("index.js", "clobber"),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap_err();
  assert!(matches!(
    err,
    BundleError::Validation(ValidationError::AssetCollision { .. })
  ));

  let err = package(
    &BundleOptions::new(&entry).with_asset("versions/x", "v"),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap_err();
  assert!(matches!(
    err,
    BundleError::Validation(ValidationError::InvalidAssetName { .. })
  ));
}
