use anyhow::Result;
use serde::Serialize;

use fnpack_lib::install::NpmInstaller;
use fnpack_lib::platform::{Platform, platform_triple};

use crate::output::{OutputFormat, print_json, print_stat, print_warning};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoOutput {
  version: &'static str,
  host: Option<String>,
  target: String,
  install_command: String,
}

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let target = Platform::deployment_target();
  let info = InfoOutput {
    version: env!("CARGO_PKG_VERSION"),
    host: platform_triple(),
    target: target.triple(),
    install_command: NpmInstaller::from_env().command_line(target),
  };

  if output.is_json() {
    return print_json(&info);
  }

  println!("fnpack {}", info.version);
  match &info.host {
    Some(host) => print_stat("Host", host),
    None => print_warning("Could not detect host platform."),
  }
  print_stat("Target", &info.target);
  print_stat("Installer", &info.install_command);
  Ok(())
}
