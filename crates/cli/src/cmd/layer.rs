//! Implementation of the `fnpack layer` command.
//!
//! A layer is unpacked under `/opt` at runtime, so its files are staged
//! under a prefix (`nodejs` by default). With `--exec-wrapper` the layer
//! also ships an `extension` script that runs the layer entry point and
//! evaluates its output before handing over to the function runtime.

use anyhow::{Context, Result};
use clap::Args;

use fnpack_lib::layout::deployment_path_for;

use super::bundle::{SourceArgs, run_package};
use crate::output::OutputFormat;

const DEFAULT_PREFIX: &str = "nodejs";
const WRAPPER_NAME: &str = "extension";

#[derive(Args, Debug)]
pub struct LayerArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Ship an exec wrapper script that runs the layer entry point first
  #[arg(long)]
  pub exec_wrapper: bool,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

/// Wrapper script run through the runtime's exec wrapper hook.
pub fn wrapper_script(entry: &str) -> String {
  format!(
    r#"#!/bin/bash
args=("$@")
OUTPUT=$(/var/lang/bin/node /opt/{entry})
eval "${{OUTPUT}}"
exec "${{args[@]}}"
"#
  )
}

pub fn cmd_layer(args: LayerArgs) -> Result<()> {
  let mut options = args.source.to_options()?;
  let prefix = options
    .deployment_prefix
    .get_or_insert_with(|| DEFAULT_PREFIX.to_string())
    .trim_end_matches('/')
    .to_string();

  if args.exec_wrapper {
    let resolved = options.validate()?;
    let entry = deployment_path_for(&resolved.entry, &resolved.root, None)
      .with_context(|| format!("Failed to place layer entry {}", resolved.entry.display()))?;
    options
      .additional_assets
      .insert(WRAPPER_NAME.to_string(), wrapper_script(&format!("{}/{}", prefix, entry)));
  }

  run_package(&options, args.output)
}
