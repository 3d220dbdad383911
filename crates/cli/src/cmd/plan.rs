//! Implementation of the `fnpack plan` command.
//!
//! Runs only the planning phase: the import graph is walked and the
//! descriptor and digest computed, but nothing is staged or installed.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use fnpack_lib::bundle::plan_bundle;
use fnpack_lib::graph::FileNode;
use fnpack_lib::manifest::PackageManifest;
use fnpack_lib::resolve::PackageIdentity;

use super::bundle::SourceArgs;
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

#[derive(Args, Debug)]
pub struct PlanArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
  digest: String,
  artifact_path: String,
  cached: bool,
  entry_point: String,
  discovered_files: Vec<FileNode>,
  discovered_modules: Vec<PackageIdentity>,
  manifest: PackageManifest,
}

pub fn cmd_plan(args: PlanArgs) -> Result<()> {
  let options = args.source.to_options()?;
  let resolved = options.validate()?;
  let plan = plan_bundle(resolved).with_context(|| format!("Failed to plan {}", options.entry_path.display()))?;
  let artifact = plan.artifact_path();

  if args.output.is_json() {
    return print_json(&PlanOutput {
      digest: plan.digest.to_string(),
      artifact_path: artifact.display().to_string(),
      cached: artifact.exists(),
      entry_point: plan.entry_point().to_string(),
      discovered_files: plan.discovered_files(),
      discovered_modules: plan.discovered_modules().to_vec(),
      manifest: plan.manifest.clone(),
    });
  }

  print_info(&format!("Plan for {}", plan.options.entry.display()));
  print_stat("Digest", &plan.digest.to_string());
  print_stat("Artifact", &artifact.display().to_string());
  print_stat("Cached", if artifact.exists() { "yes" } else { "no" });
  print_stat("Files", &plan.discovery.graph.len().to_string());
  print_stat("Entry point", plan.entry_point());
  for file in plan.discovery.graph.files() {
    println!("    {} {} {}", file.location.display(), symbols::ARROW, file.deployment_path);
    for target in plan.discovery.graph.imports_of(&file.location) {
      println!("        {} {}", symbols::PLUS, target.deployment_path);
    }
  }
  print_stat("Dependencies", &plan.manifest.dependencies.len().to_string());
  for (name, version) in &plan.manifest.dependencies {
    println!("    {} {}@{}", symbols::PLUS, name, version);
  }
  let mut excluded: Vec<_> = plan
    .discovered_modules()
    .iter()
    .filter(|m| plan.options.exclusions.contains(&m.name))
    .map(|m| m.name.as_str())
    .collect();
  excluded.sort();
  excluded.dedup();
  if !excluded.is_empty() {
    print_stat("Excluded", &excluded.join(", "));
  }
  Ok(())
}
