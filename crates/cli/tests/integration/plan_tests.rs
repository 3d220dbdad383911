//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_writes_nothing() {
  let env = TestEnv::new();
  env.write_file("a.ts", "export const a = 1;\n");
  let entry = env.write_file("index.ts", "import { a } from './a.js';\nexport const handler = () => a;\n");

  env
    .fnpack_cmd()
    .arg("plan")
    .arg(&entry)
    .assert()
    .success()
    .stdout(predicate::str::contains("a.js"))
    .stdout(predicate::str::contains("Cached"));

  assert!(!env.root().join("dist").exists());
}

#[test]
fn plan_digest_matches_bundle() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export const handler = () => 1;\n");

  let plan = env.json(env.fnpack_cmd().arg("plan").arg(&entry));
  assert_eq!(plan["cached"], false);
  let bundle = env.json(env.fnpack_cmd().arg("bundle").arg(&entry));
  assert_eq!(plan["digest"], bundle["digest"]);
  assert_eq!(plan["artifactPath"], bundle["artifactPath"]);

  let again = env.json(env.fnpack_cmd().arg("plan").arg(&entry));
  assert_eq!(again["cached"], true);
}

#[test]
fn plan_json_includes_manifest() {
  let env = TestEnv::new();
  env.install_package("left-pad", "1.3.0");
  let entry = env.write_file("index.ts", "import pad from 'left-pad';\nexport const p = pad;\n");

  let plan = env.json(env.fnpack_cmd().arg("plan").arg(&entry));
  assert_eq!(plan["manifest"]["dependencies"]["left-pad"], "1.3.0");
  assert_eq!(plan["manifest"]["type"], "module");
}
