mod cmd;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BundleArgs, LayerArgs, PlanArgs};
use output::OutputFormat;

/// Package a serverless function entry point and its local imports into a
/// content-addressed archive.
#[derive(Parser)]
#[command(name = "fnpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Bundle a function entry point
  ///
  /// The entry keeps its path relative to the root directory: `src/handler.ts`
  /// deploys as `src/handler.js`, so the function handler is
  /// `src/handler.<export>`. The reported entry point shows the exact path.
  Bundle(BundleArgs),

  /// Bundle a shared layer (files under a `nodejs/` prefix by default)
  Layer(LayerArgs),

  /// Show what a bundle would contain without writing anything
  Plan(PlanArgs),

  /// Show host platform and deployment target
  Info {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Bundle(args) => cmd::cmd_bundle(args),
    Commands::Layer(args) => cmd::cmd_layer(args),
    Commands::Plan(args) => cmd::cmd_plan(args),
    Commands::Info { output } => cmd::cmd_info(output),
  }
}
