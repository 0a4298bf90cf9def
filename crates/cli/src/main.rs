//! Content tools for the tactics rules engine.
//!
//! Run with: `tactics <command>`

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{InspectSave, Show, Validate};
use tactics_runtime::{RuntimeConfig, logging};

/// Validate and inspect ability content and saves
#[derive(Parser)]
#[command(name = "tactics")]
#[command(about = "Ability content tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load every ability in a data directory and report failures
    Validate(Validate),

    /// Show one ability as the engine sees it
    Show(Show),

    /// Summarize a saved world record
    InspectSave(InspectSave),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for TACTICS_* settings)
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env();
    let _guard = logging::init(&config)?;

    let cli = Cli::parse();

    match cli.command {
        Command::Validate(cmd) => cmd.execute(),
        Command::Show(cmd) => cmd.execute(),
        Command::InspectSave(cmd) => cmd.execute(),
    }
}
