//! Prerender CLI - local tooling for the job prerender workload.
//!
//! Commands:
//! - `prerender classify` - Show how a request would be classified
//! - `prerender render` - Render a job page from a JSON record
//! - `prerender gone` - Render the gone page for a path
//! - `prerender tombstones` - Validate a tombstone list
//! - `prerender simulate` - Run the full pipeline against local fixtures

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ClassifyArgs, GoneArgs, RenderArgs, SimulateArgs, TombstonesArgs};

/// Prerender CLI - inspect and exercise crawler prerendering locally
#[derive(Parser)]
#[command(name = "prerender")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a request by path and user agent
    Classify(ClassifyArgs),

    /// Render a job page from a JSON job record
    Render(RenderArgs),

    /// Render the gone page for a tombstoned path
    Gone(GoneArgs),

    /// Parse a tombstone list and check paths against it
    Tombstones(TombstonesArgs),

    /// Dispatch a request through the full pipeline
    Simulate(SimulateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::run(args, &ctx),
        Commands::Render(args) => commands::render::run(args, &ctx),
        Commands::Gone(args) => commands::gone::run(args, &ctx),
        Commands::Tombstones(args) => commands::tombstones::run(args, &ctx),
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
