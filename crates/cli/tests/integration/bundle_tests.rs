//! Bundle command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, install_count};

#[test]
fn bundle_reports_files_and_modules() {
  let env = TestEnv::new();
  env.install_package("left-pad", "1.3.0");
  env.write_file("lib/util.ts", "export const twice = (s: string): string => s + s;\n");
  let entry = env.write_file(
    "handler.ts",
    "import pad from 'left-pad';\nimport { twice } from './lib/util.js';\nexport const handler = () => twice(pad('a', 2));\n",
  );

  let result = env.json(env.fnpack_cmd().arg("bundle").arg(&entry));

  assert_eq!(result["cacheHit"], false);
  assert_eq!(result["entryPoint"], "handler.js");
  let files: Vec<_> = result["discoveredFiles"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["deploymentPath"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(files, vec!["handler.js", "lib/util.js"]);
  assert_eq!(result["discoveredModules"][0]["name"], "left-pad");

  let staging = env.root().join("dist/handler.ts");
  assert_eq!(install_count(&staging), 1);
  let manifest = std::fs::read_to_string(staging.join("package.json")).unwrap();
  assert!(manifest.contains(r#""left-pad": "1.3.0""#));
  assert!(manifest.contains(r#""exports": "./handler.js""#));
  let util = std::fs::read_to_string(staging.join("lib/util.js")).unwrap();
  assert_eq!(util, "export const twice = (s) => s + s;\n");
}

#[test]
fn second_bundle_reuses_archive() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export const handler = () => 1;\n");

  let first = env.json(env.fnpack_cmd().arg("bundle").arg(&entry));
  let second = env.json(env.fnpack_cmd().arg("bundle").arg(&entry));

  assert_eq!(first["artifactPath"], second["artifactPath"]);
  assert_eq!(second["cacheHit"], true);
  assert_eq!(install_count(&env.root().join("dist/index.ts")), 0);
}

#[test]
fn text_output_for_cache_hit() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export const handler = () => 1;\n");
  env.fnpack_cmd().arg("bundle").arg(&entry).assert().success();

  env
    .fnpack_cmd()
    .arg("bundle")
    .arg(&entry)
    .assert()
    .success()
    .stdout(predicate::str::contains("reusing cached archive"));
}

#[test]
fn exclude_flag_drops_dependency() {
  let env = TestEnv::new();
  env.install_package("uuid", "9.0.1");
  let entry = env.write_file("index.ts", "import { v4 } from 'uuid';\nexport const id = v4;\n");

  let result = env.json(env.fnpack_cmd().arg("bundle").arg(&entry).args(["--exclude", "uuid"]));

  assert_eq!(result["discoveredModules"][0]["name"], "uuid");
  let manifest = std::fs::read_to_string(env.root().join("dist/index.ts/package.json")).unwrap();
  let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
  assert_eq!(manifest["dependencies"], serde_json::json!({}));
}

#[test]
fn layer_result_modules_are_excluded() {
  let env = TestEnv::new();
  env.install_package("uuid", "9.0.1");
  env.install_package("left-pad", "1.3.0");
  let layer_entry = env.write_file("layer/index.ts", "import { v4 } from 'uuid';\nexport { v4 };\n");
  let layer = env.json(env.fnpack_cmd().arg("layer").arg(&layer_entry));
  let layer_result = env.write_file("layer-result.json", &layer.to_string());

  let entry = env.write_file(
    "fn/index.ts",
    "import { v4 } from 'uuid';\nimport pad from 'left-pad';\nexport const id = () => pad(v4(), 40);\n",
  );
  env
    .fnpack_cmd()
    .arg("bundle")
    .arg(&entry)
    .arg("--layer-result")
    .arg(&layer_result)
    .assert()
    .success();

  let manifest = std::fs::read_to_string(env.root().join("fn/dist/index.ts/package.json")).unwrap();
  let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
  assert_eq!(manifest["dependencies"], serde_json::json!({ "left-pad": "1.3.0" }));
}

#[test]
fn options_file_supplies_entry_and_assets() {
  let env = TestEnv::new();
  env.write_file("src/index.ts", "export const handler = () => 1;\n");
  env.write_file(
    "fnpack.json",
    r#"{ "entryPath": "src/index.ts", "additionalAssets": { "config.json": "{\"stage\":\"dev\"}" } }"#,
  );

  env
    .fnpack_cmd()
    .arg("bundle")
    .arg("--options")
    .arg(env.root().join("fnpack.json"))
    .assert()
    .success();

  let asset = std::fs::read_to_string(env.root().join("src/dist/index.ts/config.json")).unwrap();
  assert_eq!(asset, r#"{"stage":"dev"}"#);
}

#[test]
fn installer_failure_surfaces_output() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export const handler = () => 1;\n");

  env
    .fnpack_cmd()
    .env("FNPACK_INSTALL_CMD", "echo 'npm ERR! 404 nope' >&2; exit 1")
    .arg("bundle")
    .arg(&entry)
    .assert()
    .failure()
    .stderr(predicate::str::contains("npm ERR! 404 nope"));
}

#[test]
fn unresolved_import_fails() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "import { x } from './missing.js';\n");

  env
    .fnpack_cmd()
    .arg("bundle")
    .arg(&entry)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot resolve './missing.js'"));
}

#[test]
fn invalid_exclusion_is_rejected() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export {};\n");

  env
    .fnpack_cmd()
    .arg("bundle")
    .arg(&entry)
    .args(["--exclude", "Not Valid"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid excluded package name"));
}

#[test]
fn nested_entry_point_keeps_its_path() {
  let env = TestEnv::new();
  let entry = env.write_file("src/handler.ts", "export const handler = () => 1;\n");

  let result = env.json(env.fnpack_cmd().arg("bundle").arg(&entry).arg("--root").arg(env.root()));

  assert_eq!(result["entryPoint"], "src/handler.js");
}
