//! End-to-end packaging scenarios.

use fnpack_lib::bundle::{BundleOptions, package};
use fnpack_lib::resolve::PackageIdentity;

use super::common::{CountingArchiver, CountingInstaller, Project, archive_entries, archive_text};

fn two_local_imports(project: &Project) -> std::path::PathBuf {
  project.write("lib/b.ts", "export const b: string = 'b';\n");
  project.write("lib/a.ts", "import { b } from './b.js';\nexport const a = () => b;\n");
  project.write(
    "index.ts",
    "import { a } from './lib/a.js';\nimport { b } from './lib/b.js';\nexport const handler = async () => a() + b;\n",
  )
}

#[test]
fn local_imports_are_discovered_once() {
  let project = Project::new();
  let entry = two_local_imports(&project);
  let installer = CountingInstaller::default();
  let archiver = CountingArchiver::default();

  let output = package(&BundleOptions::new(&entry), &installer, &archiver).unwrap();

  let paths: Vec<_> = output.discovered_files.iter().map(|f| f.deployment_path.as_str()).collect();
  assert_eq!(paths, vec!["index.js", "lib/a.js", "lib/b.js"]);
  assert!(output.discovered_modules.is_empty());

  let manifest: serde_json::Value =
    serde_json::from_str(&archive_text(&output.artifact_path, "package.json")).unwrap();
  assert_eq!(manifest["dependencies"], serde_json::json!({}));
  assert_eq!(manifest["exports"], "./index.js");

  let files: Vec<_> = archive_entries(&output.artifact_path)
    .into_iter()
    .filter(|name| !name.ends_with('/'))
    .collect();
  assert_eq!(files, vec!["index.js", "lib/a.js", "lib/b.js", "package.json"]);
  assert_eq!(
    archive_text(&output.artifact_path, "lib/a.js"),
    "import { b } from './b.js';\nexport const a = () => b;\n"
  );
}

#[test]
fn external_package_is_declared() {
  let project = Project::new();
  project.install("left-pad", "1.3.0");
  let entry = project.write("index.ts", "import pad from 'left-pad';\nexport const handler = () => pad('x', 2);\n");

  let output = package(
    &BundleOptions::new(&entry),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap();

  let manifest: serde_json::Value =
    serde_json::from_str(&archive_text(&output.artifact_path, "package.json")).unwrap();
  assert_eq!(manifest["dependencies"], serde_json::json!({ "left-pad": "1.3.0" }));
}

#[test]
fn excluded_package_is_still_reported() {
  let project = Project::new();
  project.install("left-pad", "1.3.0");
  let entry = project.write("index.ts", "import pad from 'left-pad';\nexport const handler = () => pad('x', 2);\n");

  let output = package(
    &BundleOptions::new(&entry).with_exclusions(["left-pad"]),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap();

  let manifest: serde_json::Value =
    serde_json::from_str(&archive_text(&output.artifact_path, "package.json")).unwrap();
  assert_eq!(manifest["dependencies"], serde_json::json!({}));
  assert_eq!(
    output.discovered_modules,
    vec![PackageIdentity {
      name: "left-pad".to_string(),
      version: "1.3.0".to_string(),
    }]
  );
}

#[test]
fn unchanged_rebuild_hits_cache() {
  let project = Project::new();
  let entry = two_local_imports(&project);
  let options = BundleOptions::new(&entry);

  let first = package(&options, &CountingInstaller::default(), &CountingArchiver::default()).unwrap();

  let installer = CountingInstaller::default();
  let archiver = CountingArchiver::default();
  let second = package(&options, &installer, &archiver).unwrap();

  assert_eq!(first.artifact_path, second.artifact_path);
  assert!(second.cache_hit);
  assert_eq!(installer.calls.get(), 0);
  assert_eq!(archiver.calls.get(), 0);
}

#[test]
fn source_change_misses_cache() {
  let project = Project::new();
  let entry = two_local_imports(&project);
  let options = BundleOptions::new(&entry);
  let first = package(&options, &CountingInstaller::default(), &CountingArchiver::default()).unwrap();

  project.write("lib/b.ts", "export const b: string = 'changed';\n");
  let installer = CountingInstaller::default();
  let second = package(&options, &installer, &CountingArchiver::default()).unwrap();

  assert_ne!(first.digest, second.digest);
  assert!(!second.cache_hit);
  assert_eq!(installer.calls.get(), 1);
  assert!(first.artifact_path.exists());
  assert!(second.artifact_path.exists());
}

#[test]
fn layer_prefix_and_assets_are_staged() {
  let project = Project::new();
  let entry = project.write("index.ts", "export const config = {};\n");
  let options = BundleOptions::new(&entry)
    .with_prefix("nodejs/")
    .with_asset("extension", "#!/bin/bash\nexec \"$@\"\n");

  let output = package(&options, &CountingInstaller::default(), &CountingArchiver::default()).unwrap();

  let entries = archive_entries(&output.artifact_path);
  assert!(entries.contains(&"nodejs/index.js".to_string()));
  assert!(entries.contains(&"nodejs/package.json".to_string()));
  assert!(entries.contains(&"nodejs/extension".to_string()));
  assert!(!entries.iter().any(|e| e.starts_with("versions")));
}

#[test]
fn stale_files_do_not_reach_the_archive() {
  let project = Project::new();
  project.write("old.ts", "export const old = 1;\n");
  let entry = project.write("index.ts", "import { old } from './old.js';\nexport const v = old;\n");
  let options = BundleOptions::new(&entry);
  package(&options, &CountingInstaller::default(), &CountingArchiver::default()).unwrap();

  project.write("index.ts", "export const v = 2;\n");
  let output = package(&options, &CountingInstaller::default(), &CountingArchiver::default()).unwrap();

  let entries = archive_entries(&output.artifact_path);
  assert!(!entries.contains(&"old.js".to_string()));
  assert!(entries.contains(&"index.js".to_string()));
}

#[test]
fn builtins_and_platform_packages_are_never_declared() {
  let project = Project::new();
  let entry = project.write(
    "index.ts",
    "import { readFile } from 'node:fs/promises';\nimport path from 'path';\nimport { S3Client } from '@aws-sdk/client-s3';\nexport { readFile, path, S3Client };\n",
  );

  let output = package(
    &BundleOptions::new(&entry),
    &CountingInstaller::default(),
    &CountingArchiver::default(),
  )
  .unwrap();
  assert!(output.discovered_modules.is_empty());
}
