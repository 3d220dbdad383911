//! Layer command integration tests.

use super::common::TestEnv;

#[test]
fn layer_stages_under_nodejs_prefix() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export const config = { region: 'eu-west-1' };\n");

  env.json(env.fnpack_cmd().arg("layer").arg(&entry));

  let staging = env.root().join("dist/index.ts");
  assert!(staging.join("nodejs/index.js").is_file());
  assert!(staging.join("nodejs/package.json").is_file());
  assert!(!staging.join("index.js").exists());
}

#[test]
fn exec_wrapper_is_added() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "console.log('export A=1');\n");

  env.json(env.fnpack_cmd().arg("layer").arg(&entry).arg("--exec-wrapper"));

  let wrapper = env.root().join("dist/index.ts/nodejs/extension");
  let script = std::fs::read_to_string(&wrapper).unwrap();
  assert!(script.contains("/opt/nodejs/index.js"));

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(&wrapper).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
  }
}

#[test]
fn custom_prefix_is_respected() {
  let env = TestEnv::new();
  let entry = env.write_file("index.ts", "export {};\n");

  env.json(env.fnpack_cmd().arg("layer").arg(&entry).args(["--prefix", "nodejs/node20"]));

  assert!(env.root().join("dist/index.ts/nodejs/node20/index.js").is_file());
}
