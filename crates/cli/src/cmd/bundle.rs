//! Implementation of the `fnpack bundle` command.
//!
//! Packages a function entry point. Modules already shipped by a layer can
//! be left out of the descriptor by passing that layer's JSON result.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use fnpack_lib::archive::ZipArchiver;
use fnpack_lib::bundle::{BundleOptions, BundleOutput, package};
use fnpack_lib::install::NpmInstaller;

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_json, print_stat, print_success, symbols,
  truncate_hash,
};

/// Arguments shared by every command that packages an entry point.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
  /// Entry source file
  pub entry: Option<PathBuf>,

  /// Directory deployment paths are computed from (default: the entry's directory)
  #[arg(long)]
  pub root: Option<PathBuf>,

  /// Package name to leave out of the descriptor (repeatable)
  #[arg(short = 'x', long = "exclude", value_name = "NAME")]
  pub exclude: Vec<String>,

  /// Directory inside the archive that holds the deployed files
  #[arg(long)]
  pub prefix: Option<String>,

  /// Additional file to ship next to the descriptor (repeatable)
  #[arg(long = "asset", value_name = "NAME=PATH", value_parser = parse_asset)]
  pub assets: Vec<(String, PathBuf)>,

  /// Staging directory (default: <entry dir>/dist/<entry file name>)
  #[arg(long)]
  pub staging_root: Option<PathBuf>,

  /// JSON file with bundle options; command-line flags take precedence
  #[arg(long, value_name = "FILE")]
  pub options: Option<PathBuf>,
}

fn parse_asset(value: &str) -> Result<(String, PathBuf), String> {
  match value.split_once('=') {
    Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name.to_string(), PathBuf::from(path))),
    _ => Err(format!("expected NAME=PATH, got '{}'", value)),
  }
}

/// Resolve a path from an options file against the file's directory.
fn relative_to(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}

impl SourceArgs {
  pub fn to_options(&self) -> Result<BundleOptions> {
    let mut options = match &self.options {
      Some(file) => {
        let mut loaded = BundleOptions::from_file(file)?;
        let base = file.parent().unwrap_or(Path::new("."));
        loaded.entry_path = relative_to(base, &loaded.entry_path);
        loaded.root_directory = loaded.root_directory.map(|p| relative_to(base, &p));
        loaded.staging_root = loaded.staging_root.map(|p| relative_to(base, &p));
        loaded
      }
      None => BundleOptions::default(),
    };

    if let Some(entry) = &self.entry {
      options.entry_path = entry.clone();
    }
    if options.entry_path.as_os_str().is_empty() {
      bail!("an entry file is required (pass it directly or through --options)");
    }
    if let Some(root) = &self.root {
      options.root_directory = Some(root.clone());
    }
    if let Some(prefix) = &self.prefix {
      options.deployment_prefix = Some(prefix.clone());
    }
    if let Some(staging_root) = &self.staging_root {
      options.staging_root = Some(staging_root.clone());
    }
    options.exclusion_set.extend(self.exclude.iter().cloned());

    for (name, path) in &self.assets {
      let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read asset {}: {}", name, path.display()))?;
      options.additional_assets.insert(name.clone(), content);
    }
    Ok(options)
  }
}

#[derive(Args, Debug)]
pub struct BundleArgs {
  #[command(flatten)]
  pub source: SourceArgs,

  /// JSON output of an earlier `fnpack layer` run; its modules are excluded (repeatable)
  #[arg(long = "layer-result", value_name = "FILE")]
  pub layer_results: Vec<PathBuf>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

/// Module names a previously built layer already provides.
fn layer_modules(path: &Path) -> Result<Vec<String>> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read layer result: {}", path.display()))?;
  let layer: BundleOutput =
    serde_json::from_str(&content).with_context(|| format!("Invalid layer result: {}", path.display()))?;
  Ok(layer.discovered_modules.into_iter().map(|m| m.name).collect())
}

/// Run a bundle with the default installer and archiver and report it.
pub fn run_package(options: &BundleOptions, output: OutputFormat) -> Result<()> {
  let started = Instant::now();
  let installer = NpmInstaller::from_env();
  let result = package(options, &installer, &ZipArchiver)
    .with_context(|| format!("Failed to bundle {}", options.entry_path.display()))?;
  report(&result, output, started)
}

fn report(result: &BundleOutput, output: OutputFormat, started: Instant) -> Result<()> {
  if output.is_json() {
    return print_json(result);
  }

  if result.cache_hit {
    print_info("Bundle unchanged, reusing cached archive");
  } else {
    print_success("Bundle complete!");
  }
  print_stat("Artifact", &result.artifact_path.display().to_string());
  print_stat("Digest", truncate_hash(&result.digest.0));
  print_stat("Entry point", &result.entry_point);
  if let Ok(metadata) = fs::metadata(&result.artifact_path) {
    print_stat("Size", &format_bytes(metadata.len()));
  }
  print_stat("Files", &result.discovered_files.len().to_string());
  for file in &result.discovered_files {
    println!("    {} {}", symbols::ARROW, file.deployment_path);
  }
  print_stat("Modules", &result.discovered_modules.len().to_string());
  print_stat("Duration", &format_duration(started.elapsed()));
  Ok(())
}

pub fn cmd_bundle(args: BundleArgs) -> Result<()> {
  let mut options = args.source.to_options()?;
  for path in &args.layer_results {
    let provided = layer_modules(path)?;
    debug!(layer = %path.display(), modules = provided.len(), "excluding layer modules");
    options.exclusion_set.extend(provided);
  }
  options.exclusion_set.sort();
  options.exclusion_set.dedup();
  run_package(&options, args.output)
}
