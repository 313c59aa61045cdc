//! kindgen — expand kind-parameterised source templates.
//!
//! # Usage
//!
//! ```text
//! kindgen generate [--manifest PATH] [--clean] [--force] [--dry-run] [--strict-cache] [--no-format]
//! kindgen clean [--manifest PATH]
//! kindgen status [--manifest PATH] [--json]
//! kindgen diff <template> [--manifest PATH]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{clean::CleanArgs, diff::DiffArgs, generate::GenerateArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "kindgen",
    version,
    about = "Generate per-kind source files from templates",
    long_about = None,
)]
struct Cli {
    /// Log every expanded file (same as RUST_LOG=debug).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand changed templates and write the generated sources.
    Generate(GenerateArgs),

    /// Delete generated sources and the digest cache.
    Clean(CleanArgs),

    /// Show which templates would be regenerated.
    Status(StatusArgs),

    /// Show unified diff of what generate would write for one template.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Generate(args) => args.run(),
        Commands::Clean(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}
